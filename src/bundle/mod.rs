//! X.509 bundle types.

pub mod x509;
