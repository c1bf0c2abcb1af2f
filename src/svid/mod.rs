//! X.509-SVID types.

pub mod x509;
