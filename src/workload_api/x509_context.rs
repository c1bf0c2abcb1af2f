//! Defines a type that holds all the X.509 materials for a workload (i.e. X.509 SVIDs and bundles)

use std::sync::Arc;

use crate::constants::DEFAULT_SVID;
use crate::{X509BundleSet, X509Svid};

/// Represents all X.509 materials fetched from the Workload API in one response.
///
/// SVIDs are kept in the order the Workload API returned them.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct X509Context {
    svids: Vec<Arc<X509Svid>>,
    bundle_set: Arc<X509BundleSet>,
}

impl X509Context {
    /// Creates a new [`X509Context`].
    #[must_use]
    pub fn new(
        svids: impl IntoIterator<Item = Arc<X509Svid>>,
        bundle_set: impl Into<Arc<X509BundleSet>>,
    ) -> Self {
        Self {
            svids: svids.into_iter().collect(),
            bundle_set: bundle_set.into(),
        }
    }

    /// Returns the default [`X509Svid`], if present.
    ///
    /// The default SVID is the first SVID returned by the Workload API.
    pub fn default_svid(&self) -> Option<&Arc<X509Svid>> {
        self.svids.get(DEFAULT_SVID)
    }

    /// Returns all X.509 SVIDs in this context.
    pub fn svids(&self) -> &[Arc<X509Svid>] {
        &self.svids
    }

    /// Returns the set of X.509 bundles associated with this context.
    pub fn bundle_set(&self) -> &Arc<X509BundleSet> {
        &self.bundle_set
    }
}
