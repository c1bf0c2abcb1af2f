use std::sync::LazyLock;

use tonic::metadata::{Ascii, MetadataKey, MetadataValue};

const SPIFFE_HEADER_KEY: &str = "workload.spiffe.io";
const SPIFFE_HEADER_VALUE: &str = "true";

static PARSED_HEADER_KEY: LazyLock<MetadataKey<Ascii>> =
    LazyLock::new(|| MetadataKey::from_static(SPIFFE_HEADER_KEY));

static PARSED_HEADER_VALUE: LazyLock<MetadataValue<Ascii>> =
    LazyLock::new(|| MetadataValue::from_static(SPIFFE_HEADER_VALUE));

/// Tonic interceptor that adds the Workload API metadata header required by SPIRE.
#[derive(Debug, Clone, Copy)]
pub(super) struct MetadataAdder;

impl tonic::service::Interceptor for MetadataAdder {
    fn call(
        &mut self,
        mut request: tonic::Request<()>,
    ) -> Result<tonic::Request<()>, tonic::Status> {
        // tonic's metadata insert() takes owned values.
        request
            .metadata_mut()
            .insert(PARSED_HEADER_KEY.clone(), PARSED_HEADER_VALUE.clone());
        Ok(request)
    }
}
