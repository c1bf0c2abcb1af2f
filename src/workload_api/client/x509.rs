use std::sync::Arc;

use crate::constants::DEFAULT_SVID;
use crate::prelude::warn;
use crate::workload_api::pb::workload::{X509svid, X509svidRequest, X509svidResponse};
use crate::workload_api::x509_context::X509Context;
use crate::{TrustDomain, WorkloadApiClient, WorkloadApiError, X509Bundle, X509BundleSet, X509Svid};

impl WorkloadApiClient {
    /// Fetches the default X.509 SVID for the calling workload from the SPIFFE Workload API.
    ///
    /// Only the first message of the `FetchX509SVID` stream is read.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkloadApiError`] if the gRPC request fails, the response stream
    /// ends unexpectedly, or the received data is invalid.
    pub async fn fetch_x509_svid(&self) -> Result<X509Svid, WorkloadApiError> {
        let response = self.fetch_first_x509svid_response().await?;
        Self::parse_x509_svid_from_grpc_response(&response)
    }

    /// Fetches the current X.509 context (SVIDs and bundles).
    ///
    /// Only the first message of the `FetchX509SVID` stream is read.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkloadApiError`] if the Workload API request fails, the response
    /// stream terminates unexpectedly, or the received data cannot be parsed.
    pub async fn fetch_x509_context(&self) -> Result<X509Context, WorkloadApiError> {
        let response = self.fetch_first_x509svid_response().await?;
        Self::parse_x509_context_from_grpc_response(response)
    }

    async fn fetch_first_x509svid_response(&self) -> Result<X509svidResponse, WorkloadApiError> {
        let mut client = self.client.clone();

        let grpc_stream_response: tonic::Response<tonic::Streaming<X509svidResponse>> =
            client.fetch_x509svid(X509svidRequest::default()).await?;

        Self::first_message(grpc_stream_response.into_inner()).await
    }
}

impl WorkloadApiClient {
    fn parse_x509_svid_from_grpc_response(
        response: &X509svidResponse,
    ) -> Result<X509Svid, WorkloadApiError> {
        let svid = response
            .svids
            .get(DEFAULT_SVID)
            .ok_or(WorkloadApiError::EmptyResponse)?;

        parse_x509_svid(svid)
    }

    /// Parses a `FetchX509SVID` response into an [`X509Context`].
    ///
    /// The default SVID must parse. Any other SVID that fails to parse is left out of the
    /// context together with its bundle.
    pub(crate) fn parse_x509_context_from_grpc_response(
        response: X509svidResponse,
    ) -> Result<X509Context, WorkloadApiError> {
        let mut svids: Vec<Arc<X509Svid>> = Vec::with_capacity(response.svids.len());
        let mut bundle_set = X509BundleSet::new();

        for (index, svid) in response.svids.iter().enumerate() {
            let x509_svid = match parse_x509_svid(svid) {
                Ok(x509_svid) => x509_svid,
                Err(e) if index != DEFAULT_SVID => {
                    warn!(
                        "Skipping X.509-SVID {} ('{}') of the Workload API response: {}",
                        index, svid.spiffe_id, e
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };

            let trust_domain = x509_svid.spiffe_id().trust_domain().clone();
            bundle_set.add_bundle(X509Bundle::parse_from_der(trust_domain, &svid.bundle)?);

            svids.push(Arc::new(x509_svid));
        }

        for (trust_domain, bundle) in response.federated_bundles {
            let trust_domain = TrustDomain::try_from(trust_domain)?;
            bundle_set.add_bundle(X509Bundle::parse_from_der(trust_domain, &bundle)?);
        }

        Ok(X509Context::new(svids, bundle_set))
    }
}

fn parse_x509_svid(svid: &X509svid) -> Result<X509Svid, WorkloadApiError> {
    let hint = (!svid.hint.is_empty()).then(|| Arc::<str>::from(svid.hint.as_str()));

    Ok(X509Svid::parse_from_der_with_hint(
        &svid.x509_svid,
        &svid.x509_svid_key,
        hint,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::X509SvidError;

    const CHAIN: &[u8] = include_bytes!("../../../tests/testdata/svid-chain.der");
    const KEY: &[u8] = include_bytes!("../../../tests/testdata/svid-key.der");
    const BUNDLE: &[u8] = include_bytes!("../../../tests/testdata/bundle.der");

    fn svid_message(chain: &[u8], hint: &str) -> X509svid {
        X509svid {
            spiffe_id: "spiffe://example.org/workload-a".to_owned(),
            x509_svid: chain.to_vec(),
            x509_svid_key: KEY.to_vec(),
            bundle: BUNDLE.to_vec(),
            hint: hint.to_owned(),
        }
    }

    #[test]
    fn parse_context_keeps_svid_order_and_bundles() {
        let mut response = X509svidResponse {
            svids: vec![svid_message(CHAIN, "internal"), svid_message(CHAIN, "")],
            ..Default::default()
        };
        response
            .federated_bundles
            .insert("spiffe://federated.org".to_owned(), BUNDLE.to_vec());

        let context = WorkloadApiClient::parse_x509_context_from_grpc_response(response).unwrap();

        assert_eq!(context.svids().len(), 2);
        let default_svid = context.default_svid().unwrap();
        assert_eq!(default_svid.hint(), Some("internal"));
        assert_eq!(context.svids()[1].hint(), None);

        let example = TrustDomain::new("example.org").unwrap();
        let federated = TrustDomain::new("federated.org").unwrap();
        assert_eq!(context.bundle_set().len(), 2);
        assert!(context.bundle_set().bundle_for(&example).is_some());
        assert!(context.bundle_set().bundle_for(&federated).is_some());
    }

    #[test]
    fn parse_context_without_svids_is_empty() {
        let context =
            WorkloadApiClient::parse_x509_context_from_grpc_response(X509svidResponse::default())
                .unwrap();
        assert!(context.default_svid().is_none());
    }

    #[test]
    fn parse_context_with_empty_chain_fails() {
        let response = X509svidResponse {
            svids: vec![svid_message(&[], "")],
            ..Default::default()
        };

        let err = WorkloadApiClient::parse_x509_context_from_grpc_response(response).unwrap_err();
        assert!(matches!(
            err,
            WorkloadApiError::X509Svid(X509SvidError::EmptyChain)
        ));
    }

    #[test]
    fn parse_context_with_empty_chain_after_default_skips_it() {
        let response = X509svidResponse {
            svids: vec![svid_message(CHAIN, "default"), svid_message(&[], "broken")],
            ..Default::default()
        };

        let context = WorkloadApiClient::parse_x509_context_from_grpc_response(response).unwrap();

        assert_eq!(context.svids().len(), 1);
        assert_eq!(context.default_svid().unwrap().hint(), Some("default"));
    }

    #[test]
    fn parse_context_with_empty_default_chain_fails_even_if_others_parse() {
        let response = X509svidResponse {
            svids: vec![svid_message(&[], ""), svid_message(CHAIN, "")],
            ..Default::default()
        };

        let err = WorkloadApiClient::parse_x509_context_from_grpc_response(response).unwrap_err();
        assert!(matches!(
            err,
            WorkloadApiError::X509Svid(X509SvidError::EmptyChain)
        ));
    }

    #[test]
    fn parse_context_with_invalid_federated_trust_domain_fails() {
        let mut response = X509svidResponse::default();
        response
            .federated_bundles
            .insert("spiffe://Not Valid".to_owned(), BUNDLE.to_vec());

        let err = WorkloadApiClient::parse_x509_context_from_grpc_response(response).unwrap_err();
        assert!(matches!(err, WorkloadApiError::SpiffeId(_)));
    }

    #[test]
    fn parse_svid_without_svids_is_empty_response() {
        let err = WorkloadApiClient::parse_x509_svid_from_grpc_response(
            &X509svidResponse::default(),
        )
        .unwrap_err();
        assert!(matches!(err, WorkloadApiError::EmptyResponse));
    }

    #[test]
    fn parse_svid_uses_first_entry() {
        let response = X509svidResponse {
            svids: vec![svid_message(CHAIN, "first"), svid_message(CHAIN, "second")],
            ..Default::default()
        };

        let svid = WorkloadApiClient::parse_x509_svid_from_grpc_response(&response).unwrap();
        assert_eq!(svid.hint(), Some("first"));
        assert_eq!(svid.spiffe_id().to_string(), "spiffe://example.org/workload-a");
    }
}
