use std::str::FromStr as _;

use svid_info::cert::error::{CertificateError, PrivateKeyError};
use svid_info::{SpiffeId, X509Svid, X509SvidError};
use time::macros::datetime;

const CHAIN: &[u8] = include_bytes!("testdata/svid-chain.der");
const LEAF: &[u8] = include_bytes!("testdata/svid-leaf.der");
const KEY: &[u8] = include_bytes!("testdata/svid-key.der");

#[test]
fn test_x509_svid_parse_from_der_chain() {
    let x509_svid = X509Svid::parse_from_der(CHAIN, KEY).unwrap();

    assert_eq!(
        x509_svid.spiffe_id(),
        &SpiffeId::from_str("spiffe://example.org/workload-a").unwrap()
    );
    assert_eq!(x509_svid.cert_chain().len(), 2);
    assert_eq!(x509_svid.leaf().as_ref(), LEAF);
    assert_eq!(x509_svid.private_key().as_ref(), KEY);
    assert_eq!(x509_svid.hint(), None);
}

#[test]
fn test_x509_svid_expiration_comes_from_leaf() {
    let x509_svid = X509Svid::parse_from_der(CHAIN, KEY).unwrap();

    let leaf_not_after = x509_svid.leaf().not_after().unwrap();
    let issuer_not_after = x509_svid.cert_chain()[1].not_after().unwrap();

    assert_eq!(leaf_not_after, datetime!(2030-01-01 0:00 UTC));
    assert_ne!(leaf_not_after, issuer_not_after);
}

#[test]
fn test_x509_svid_parse_from_single_der() {
    let x509_svid = X509Svid::parse_from_der(LEAF, KEY).unwrap();

    assert_eq!(x509_svid.cert_chain().len(), 1);
    assert_eq!(x509_svid.leaf().as_ref(), LEAF);
}

#[test]
fn test_x509_svid_parse_from_der_empty_chain() {
    let result = X509Svid::parse_from_der(&[], KEY);

    assert_eq!(result.unwrap_err(), X509SvidError::EmptyChain);
}

#[test]
fn test_x509_svid_parse_from_der_corrupted_cert() {
    let certs_bytes: &[u8] = include_bytes!("testdata/corrupted");

    let result = X509Svid::parse_from_der(certs_bytes, KEY);

    assert!(matches!(
        result.unwrap_err(),
        X509SvidError::Certificate(CertificateError::ParseX509Certificate(..))
    ));
}

#[test]
fn test_x509_svid_parse_from_der_corrupted_private_key() {
    let key_bytes: &[u8] = include_bytes!("testdata/corrupted");

    let result = X509Svid::parse_from_der(CHAIN, key_bytes);

    assert!(matches!(
        result.unwrap_err(),
        X509SvidError::PrivateKey(PrivateKeyError::DecodePkcs8(..))
    ));
}

#[test]
fn test_x509_svid_parse_from_der_leaf_ca() {
    let certs_bytes: &[u8] = include_bytes!("testdata/wrong-leaf-ca-true.der");

    let result = X509Svid::parse_from_der(certs_bytes, KEY);

    assert_eq!(result.unwrap_err(), X509SvidError::LeafCertificateHasCaFlag);
}

#[test]
fn test_x509_svid_parse_from_der_issuer_as_leaf() {
    // The CA certificate has keyCertSign and no digitalSignature.
    let certs_bytes: &[u8] = include_bytes!("testdata/bundle.der");

    let result = X509Svid::parse_from_der(certs_bytes, KEY);

    assert_eq!(
        result.unwrap_err(),
        X509SvidError::LeafCertificateMissingDigitalSignature
    );
}

#[test]
fn test_x509_svid_parse_from_der_missing_spiffe_id() {
    let certs_bytes: &[u8] = include_bytes!("testdata/svid-no-spiffe-id.der");

    let result = X509Svid::parse_from_der(certs_bytes, KEY);

    assert_eq!(
        result.unwrap_err(),
        X509SvidError::Certificate(CertificateError::MissingSpiffeId)
    );
}
