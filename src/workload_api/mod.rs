//! A client to interact with the SPIFFE Workload API to fetch X.509 materials.
//!
//! [`crate::SvidFetcher`] builds on [`WorkloadApiClient`] to perform a single
//! connect/fetch/release cycle and reduce the result to a [`crate::SvidInfo`].

// Generated protobuf bindings for `src/proto/workload.proto`.
// Regenerate with: `cargo run -p xtask -- gen` from the repo root.
#[allow(
    dead_code,
    clippy::derive_partial_eq_without_eq,
    clippy::doc_markdown,
    unreachable_pub,
    unused_qualifications,
    unused_results
)]
pub(crate) mod pb {
    pub(crate) mod workload {
        include!("pb/workload.rs");
    }
}

pub mod client;
pub mod endpoint;
pub mod error;
pub mod x509_context;

pub use client::WorkloadApiClient;
pub use error::WorkloadApiError;
pub use x509_context::X509Context;
