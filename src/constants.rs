//! Constants shared across the crate.

/// Index of the default SVID within the list returned by the Workload API.
///
/// The Workload API orders SVIDs so that the first one is the default identity of the
/// workload.
pub const DEFAULT_SVID: usize = 0;

/// Name of the environment variable that configures the Workload API endpoint address.
pub const SPIFFE_SOCKET_ENV: &str = "SPIFFE_ENDPOINT_SOCKET";

/// Address used when [`SPIFFE_SOCKET_ENV`] is unset or blank.
///
/// This is the public socket of a SPIRE agent running with its stock configuration.
pub const DEFAULT_ENDPOINT_SOCKET: &str = "unix:/tmp/spire-agent/public/api.sock";
