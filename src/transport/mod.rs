//! gRPC transport for Workload API endpoints.
//!
//! Builds a `tonic` channel from a parsed [`Endpoint`](crate::endpoint::Endpoint).

pub mod connector;
pub mod error;

pub use connector::connect_lazy;
pub use error::TransportError;
