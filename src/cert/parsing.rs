//! Internal parsing and validation helpers.

use crate::cert::error::CertificateError;
use crate::cert::Certificate;
use crate::spiffe_id::SPIFFE_SCHEME_PREFIX;
use crate::SpiffeId;
use x509_parser::certificate::X509Certificate;
use x509_parser::der_parser::oid::Oid;
use x509_parser::error::X509Error;
use x509_parser::extensions::ParsedExtension;
use x509_parser::nom::Err;
use x509_parser::oid_registry;
use x509_parser::prelude::GeneralName;

/// Maximum number of certificates accepted in an X.509-SVID chain.
///
/// A SPIFFE chain holds the leaf plus a handful of intermediates; anything longer is
/// rejected before it is parsed.
const MAX_CERT_CHAIN_LENGTH: usize = 16;

/// Splits a concatenated chain of DER-encoded certificates into a `Vec<Certificate>`,
/// preserving order.
pub(crate) fn to_certificate_vec(
    cert_chain_der: &[u8],
) -> Result<Vec<Certificate>, CertificateError> {
    split_certificates(cert_chain_der, Some(MAX_CERT_CHAIN_LENGTH))
}

/// Splits a concatenated list of DER-encoded certificates with no length limit.
///
/// Bundles may legitimately carry many trust anchors.
pub(crate) fn to_certificate_vec_unbounded(
    cert_list_der: &[u8],
) -> Result<Vec<Certificate>, CertificateError> {
    split_certificates(cert_list_der, None)
}

fn split_certificates(
    der: &[u8],
    max: Option<usize>,
) -> Result<Vec<Certificate>, CertificateError> {
    let mut rest = der;
    let mut certs = Vec::new();

    while !rest.is_empty() {
        if let Some(max) = max {
            if certs.len() >= max {
                return Err(CertificateError::TooManyCertificates { max });
            }
        }

        let (new_rest, _cert) = x509_parser::parse_x509_certificate(rest).map_err(nom_to_error)?;

        // The certificate's DER is the prefix of `rest` consumed by the parser.
        let cert_len = rest.len() - new_rest.len();
        certs.push(Certificate(rest[..cert_len].to_vec()));

        rest = new_rest;
    }

    Ok(certs)
}

/// Parses the given DER-encoded bytes as an X.509 certificate.
pub(crate) fn parse_der_encoded_bytes_as_x509_certificate(
    der_bytes: &[u8],
) -> Result<X509Certificate<'_>, CertificateError> {
    x509_parser::parse_x509_certificate(der_bytes)
        .map(|(_, cert)| cert)
        .map_err(nom_to_error)
}

fn nom_to_error(e: Err<X509Error>) -> CertificateError {
    match e {
        Err::Incomplete(_) => CertificateError::ParseX509Certificate(X509Error::InvalidCertificate),
        Err::Error(err) | Err::Failure(err) => CertificateError::ParseX509Certificate(err),
    }
}

/// Returns the parsed X.509 extension for the provided OID.
///
/// Fails with [`CertificateError::MissingX509Extension`] if the extension is absent.
pub(crate) fn get_x509_extension<'a>(
    cert: &'a X509Certificate<'_>,
    oid: &Oid<'static>,
) -> Result<&'a ParsedExtension<'a>, CertificateError> {
    match cert.tbs_certificate.get_extension_unique(oid)? {
        None => Err(CertificateError::MissingX509Extension(oid.clone())),
        Some(ext) => Ok(ext.parsed_extension()),
    }
}

/// Returns the single SPIFFE ID held in the certificate's URI SAN.
pub(crate) fn extract_single_spiffe_id_from_uri_san(
    cert: &X509Certificate<'_>,
) -> Result<SpiffeId, CertificateError> {
    let ext = get_x509_extension(cert, &oid_registry::OID_X509_EXT_SUBJECT_ALT_NAME)?;

    let san = match ext {
        ParsedExtension::SubjectAlternativeName(s) => s,
        other => return Err(CertificateError::UnexpectedExtension(format!("{other:?}"))),
    };

    let mut ids = san.general_names.iter().filter_map(|name| match name {
        GeneralName::URI(uri) if uri.starts_with(SPIFFE_SCHEME_PREFIX) => Some(*uri),
        _ => None,
    });

    let first = ids.next().ok_or(CertificateError::MissingSpiffeId)?;
    if ids.next().is_some() {
        return Err(CertificateError::MultipleSpiffeIds);
    }

    Ok(SpiffeId::new(first)?)
}
