//! Workload API endpoint address resolution.
//!
//! SPIFFE Workload API clients discover the endpoint via the `SPIFFE_ENDPOINT_SOCKET`
//! environment variable. When it is unset or blank, the well-known SPIRE agent socket
//! is used instead.
//!
//! Resolution is total: it never fails and performs no I/O. Validation happens later, when
//! the address is parsed into an [`Endpoint`](crate::Endpoint).

use std::fmt;

use crate::constants::{DEFAULT_ENDPOINT_SOCKET, SPIFFE_SOCKET_ENV};
use crate::prelude::warn;

/// A non-blank Workload API endpoint address, e.g. `unix:/tmp/spire-agent/public/api.sock`.
///
/// The address is kept exactly as provided; it is not trimmed or validated as a URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointAddress(String);

impl EndpointAddress {
    /// Wraps `address`, returning `None` if it is empty or whitespace-only.
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        if address.trim().is_empty() {
            return None;
        }
        Some(Self(address))
    }

    /// Returns the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EndpointAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolves the Workload API address from the process environment.
///
/// Returns the value of `SPIFFE_ENDPOINT_SOCKET` verbatim when it is set and non-blank,
/// otherwise [`DEFAULT_ENDPOINT_SOCKET`]. A non-UTF-8 value is treated as unset.
pub fn resolve_endpoint_address() -> EndpointAddress {
    resolve_endpoint_address_with(|name| std::env::var(name).ok())
}

/// Resolves the Workload API address using `lookup` to read environment variables.
///
/// `lookup` receives the variable name and returns its value, if any.
pub fn resolve_endpoint_address_with(
    lookup: impl FnOnce(&str) -> Option<String>,
) -> EndpointAddress {
    if let Some(address) = lookup(SPIFFE_SOCKET_ENV).and_then(EndpointAddress::new) {
        return address;
    }

    warn!(
        "{} is not set; using default Workload API address {}",
        SPIFFE_SOCKET_ENV, DEFAULT_ENDPOINT_SOCKET
    );
    EndpointAddress(DEFAULT_ENDPOINT_SOCKET.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(value: Option<&str>) -> EndpointAddress {
        resolve_endpoint_address_with(|name| {
            assert_eq!(name, SPIFFE_SOCKET_ENV);
            value.map(str::to_owned)
        })
    }

    macro_rules! resolve_tests {
        ($($name:ident: $value:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let (input, expected) = $value;
                    assert_eq!(resolve(input).as_str(), expected);
                }
            )*
        }
    }

    resolve_tests! {
        resolve_unset_uses_default: (None, DEFAULT_ENDPOINT_SOCKET),
        resolve_empty_uses_default: (Some(""), DEFAULT_ENDPOINT_SOCKET),
        resolve_whitespace_uses_default: (Some("  \t\n"), DEFAULT_ENDPOINT_SOCKET),
        resolve_unix_override: (Some("unix:///run/agent.sock"), "unix:///run/agent.sock"),
        resolve_tcp_override: (Some("tcp://127.0.0.1:8081"), "tcp://127.0.0.1:8081"),
        resolve_keeps_surrounding_whitespace: (Some(" unix:/x.sock "), " unix:/x.sock "),
        resolve_does_not_validate: (Some("not a uri"), "not a uri"),
    }

    #[test]
    fn default_address_is_spire_agent_socket() {
        assert_eq!(DEFAULT_ENDPOINT_SOCKET, "unix:/tmp/spire-agent/public/api.sock");
    }

    #[test]
    fn endpoint_address_rejects_blank() {
        assert!(EndpointAddress::new("").is_none());
        assert!(EndpointAddress::new(" ").is_none());
        assert_eq!(
            EndpointAddress::new("unix:/a").unwrap().to_string(),
            "unix:/a"
        );
    }
}
