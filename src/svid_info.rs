//! The identity summary returned by [`crate::SvidFetcher`].

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::SpiffeId;

/// SPIFFE ID and expiration of a workload's default X.509-SVID.
///
/// `expires_at` is the `notAfter` instant of the leaf certificate; issuer certificates in the
/// chain do not affect it.
///
/// Serializes as `{"identity": "<spiffe id>", "expiresAt": "<RFC 3339 instant>"}`.
///
/// ```
/// use svid_info::{SpiffeId, SvidInfo};
/// use time::macros::datetime;
///
/// let info = SvidInfo::new(
///     SpiffeId::new("spiffe://example.org/workload-a").unwrap(),
///     datetime!(2030-01-01 0:00 UTC),
/// );
/// assert_eq!(info.spiffe_id().path(), "/workload-a");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SvidInfo {
    #[serde(rename = "identity")]
    spiffe_id: SpiffeId,
    #[serde(with = "time::serde::rfc3339")]
    expires_at: OffsetDateTime,
}

impl SvidInfo {
    /// Creates a new `SvidInfo`.
    pub fn new(spiffe_id: SpiffeId, expires_at: OffsetDateTime) -> Self {
        Self {
            spiffe_id,
            expires_at,
        }
    }

    /// Returns the SPIFFE ID of the SVID.
    pub fn spiffe_id(&self) -> &SpiffeId {
        &self.spiffe_id
    }

    /// Returns the `notAfter` instant of the leaf certificate.
    pub fn expires_at(&self) -> OffsetDateTime {
        self.expires_at
    }
}
