use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use svid_info::transport::TransportError;
use svid_info::{
    resolve_endpoint_address_with, Connect, Endpoint, EndpointAddress, FetchX509Context,
    SvidFetchError, SvidFetchErrorKind, SvidFetcher, WorkloadApiError, X509BundleSet, X509Context,
    X509Svid, X509SvidError,
};
use time::macros::datetime;

const CHAIN: &[u8] = include_bytes!("testdata/svid-chain.der");
const LEAF: &[u8] = include_bytes!("testdata/svid-leaf.der");
const KEY: &[u8] = include_bytes!("testdata/svid-key.der");

/// What the mock Workload API answers.
#[derive(Clone, Copy)]
enum Reply {
    Chain(&'static [u8]),
    NoSvids,
    EmptyChain,
    Unavailable,
}

#[derive(Default)]
struct Counters {
    connects: AtomicUsize,
    releases: AtomicUsize,
    endpoints: Mutex<Vec<Endpoint>>,
}

struct MockConnector {
    reply: Reply,
    counters: Arc<Counters>,
}

impl MockConnector {
    fn new(reply: Reply) -> (Self, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let connector = Self {
            reply,
            counters: Arc::clone(&counters),
        };
        (connector, counters)
    }
}

struct MockClient {
    reply: Reply,
    counters: Arc<Counters>,
}

impl Drop for MockClient {
    fn drop(&mut self) {
        self.counters.releases.fetch_add(1, Ordering::SeqCst);
    }
}

impl Connect for MockConnector {
    type Client = MockClient;

    fn connect(&self, endpoint: &Endpoint) -> Result<MockClient, WorkloadApiError> {
        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        self.counters.endpoints.lock().unwrap().push(endpoint.clone());
        Ok(MockClient {
            reply: self.reply,
            counters: Arc::clone(&self.counters),
        })
    }
}

impl FetchX509Context for MockClient {
    async fn fetch_x509_context(&self) -> Result<X509Context, WorkloadApiError> {
        match self.reply {
            Reply::Chain(chain) => {
                let svid = X509Svid::parse_from_der(chain, KEY)?;
                Ok(X509Context::new([Arc::new(svid)], X509BundleSet::new()))
            }
            Reply::NoSvids => Ok(X509Context::new(
                Vec::<Arc<X509Svid>>::new(),
                X509BundleSet::new(),
            )),
            // An SVID message without certificates fails to parse as an X.509-SVID.
            Reply::EmptyChain => Err(X509Svid::parse_from_der(&[], KEY).unwrap_err().into()),
            Reply::Unavailable => Err(WorkloadApiError::Transport(TransportError::Status(
                tonic::Status::unavailable("connection refused"),
            ))),
        }
    }
}

/// A connector whose transport cannot be built.
struct UnsupportedConnector;

impl Connect for UnsupportedConnector {
    type Client = MockClient;

    fn connect(&self, _endpoint: &Endpoint) -> Result<MockClient, WorkloadApiError> {
        Err(WorkloadApiError::Transport(
            TransportError::UnsupportedEndpointTransport { scheme: "unix" },
        ))
    }
}

fn default_address() -> EndpointAddress {
    resolve_endpoint_address_with(|_| None)
}

#[tokio::test]
async fn fetch_with_default_address_returns_leaf_identity_and_expiration() {
    let (connector, counters) = MockConnector::new(Reply::Chain(LEAF));
    let fetcher = SvidFetcher::with_connector(connector);

    let address = default_address();
    assert_eq!(address.as_str(), "unix:/tmp/spire-agent/public/api.sock");

    let info = fetcher.fetch(&address).await.unwrap();

    assert_eq!(info.spiffe_id().to_string(), "spiffe://example.org/workload-a");
    assert_eq!(info.expires_at(), datetime!(2030-01-01 0:00 UTC));
    assert_eq!(
        serde_json::to_string(&info).unwrap(),
        r#"{"identity":"spiffe://example.org/workload-a","expiresAt":"2030-01-01T00:00:00Z"}"#
    );
    assert_eq!(counters.connects.load(Ordering::SeqCst), 1);
    assert_eq!(counters.releases.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn fetch_ignores_issuer_certificate_for_expiration() {
    let (connector, _) = MockConnector::new(Reply::Chain(CHAIN));
    let fetcher = SvidFetcher::with_connector(connector);

    let info = fetcher.fetch(&default_address()).await.unwrap();

    // The issuer expires in 2035.
    assert_eq!(info.expires_at(), datetime!(2030-01-01 0:00 UTC));
}

#[tokio::test]
async fn fetch_passes_parsed_address_to_connector() {
    let (connector, counters) = MockConnector::new(Reply::Chain(LEAF));
    let fetcher = SvidFetcher::with_connector(connector);

    let address = EndpointAddress::new("tcp://127.0.0.1:8081").unwrap();
    fetcher.fetch(&address).await.unwrap();

    assert_eq!(
        *counters.endpoints.lock().unwrap(),
        vec![Endpoint::parse("tcp:127.0.0.1:8081").unwrap()]
    );
}

#[tokio::test]
async fn fetch_empty_chain_fails_and_releases_once() {
    let (connector, counters) = MockConnector::new(Reply::EmptyChain);
    let fetcher = SvidFetcher::with_connector(connector);

    let err = fetcher.fetch(&default_address()).await.unwrap_err();

    assert!(matches!(err, SvidFetchError::EmptyCertificateChain));
    assert_eq!(err.kind(), SvidFetchErrorKind::EmptyCertificateChain);
    assert_eq!(counters.connects.load(Ordering::SeqCst), 1);
    assert_eq!(counters.releases.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn fetch_transport_failure_is_context_fetch_failed_and_releases() {
    let (connector, counters) = MockConnector::new(Reply::Unavailable);
    let fetcher = SvidFetcher::with_connector(connector);

    let err = fetcher.fetch(&default_address()).await.unwrap_err();

    assert!(matches!(
        err,
        SvidFetchError::ContextFetchFailed {
            source: WorkloadApiError::Transport(_)
        }
    ));
    assert_eq!(counters.releases.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn fetch_context_without_svids_is_context_fetch_failed() {
    let (connector, counters) = MockConnector::new(Reply::NoSvids);
    let fetcher = SvidFetcher::with_connector(connector);

    let err = fetcher.fetch(&default_address()).await.unwrap_err();

    assert!(matches!(
        err,
        SvidFetchError::ContextFetchFailed {
            source: WorkloadApiError::EmptyResponse
        }
    ));
    assert_eq!(counters.releases.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn fetch_invalid_svid_is_context_fetch_failed() {
    let (connector, _) =
        MockConnector::new(Reply::Chain(include_bytes!("testdata/wrong-leaf-ca-true.der")));
    let fetcher = SvidFetcher::with_connector(connector);

    let err = fetcher.fetch(&default_address()).await.unwrap_err();

    assert!(matches!(
        err,
        SvidFetchError::ContextFetchFailed {
            source: WorkloadApiError::X509Svid(X509SvidError::LeafCertificateHasCaFlag)
        }
    ));
}

#[tokio::test]
async fn fetch_with_invalid_address_never_connects() {
    let (connector, counters) = MockConnector::new(Reply::Chain(LEAF));
    let fetcher = SvidFetcher::with_connector(connector);

    let address = EndpointAddress::new("http://127.0.0.1:8081").unwrap();
    let err = fetcher.fetch(&address).await.unwrap_err();

    match err {
        SvidFetchError::InvalidEndpoint { address, source } => {
            assert_eq!(address, "http://127.0.0.1:8081");
            assert!(matches!(source, WorkloadApiError::Endpoint(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(counters.connects.load(Ordering::SeqCst), 0);
    assert_eq!(counters.releases.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn fetch_with_unsupported_transport_is_invalid_endpoint() {
    let fetcher = SvidFetcher::with_connector(UnsupportedConnector);

    let err = fetcher.fetch(&default_address()).await.unwrap_err();

    assert_eq!(err.kind(), SvidFetchErrorKind::InvalidEndpoint);
}

#[tokio::test]
async fn sequential_fetches_are_identical_and_independent() {
    let (connector, counters) = MockConnector::new(Reply::Chain(CHAIN));
    let fetcher = SvidFetcher::with_connector(connector);
    let address = default_address();

    let first = fetcher.fetch(&address).await.unwrap();
    let second = fetcher.fetch(&address).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(counters.connects.load(Ordering::SeqCst), 2);
    assert_eq!(counters.releases.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn concurrent_fetches_each_use_their_own_client() {
    let (connector, counters) = MockConnector::new(Reply::Chain(CHAIN));
    let fetcher = Arc::new(SvidFetcher::with_connector(connector));
    let address = default_address();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let fetcher = Arc::clone(&fetcher);
            let address = address.clone();
            tokio::spawn(async move { fetcher.fetch(&address).await })
        })
        .collect();

    for handle in handles {
        let info = handle.await.unwrap().unwrap();
        assert_eq!(info.expires_at(), datetime!(2030-01-01 0:00 UTC));
    }
    assert_eq!(counters.connects.load(Ordering::SeqCst), 4);
    assert_eq!(counters.releases.load(Ordering::SeqCst), 4);
}

#[cfg(unix)]
#[tokio::test]
async fn grpc_fetch_from_missing_socket_is_context_fetch_failed() {
    let address = EndpointAddress::new("unix:/nonexistent/spire-agent/public/api.sock").unwrap();

    let result = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        SvidFetcher::new().fetch(&address),
    )
    .await
    .expect("fetch against a missing socket should fail promptly");

    assert_eq!(
        result.unwrap_err().kind(),
        SvidFetchErrorKind::ContextFetchFailed
    );
}

#[tokio::test]
async fn grpc_fetch_with_http_scheme_is_invalid_endpoint() {
    let address = EndpointAddress::new("http://127.0.0.1:8081").unwrap();

    let err = svid_info::fetch_svid_info(&address).await.unwrap_err();

    assert_eq!(err.kind(), SvidFetchErrorKind::InvalidEndpoint);
}
