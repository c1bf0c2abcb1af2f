use crate::cert::parsing::{
    extract_single_spiffe_id_from_uri_san, get_x509_extension,
    parse_der_encoded_bytes_as_x509_certificate,
};
use crate::cert::Certificate;
use crate::spiffe_id::SpiffeId;
use crate::svid::x509::X509SvidError;
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::ParsedExtension;
use x509_parser::oid_registry;

/// Parses `cert` as X.509, validates it as an X.509-SVID leaf,
/// and returns the [`SpiffeId`] from the URI SAN.
pub(super) fn validate_leaf_certificate(cert: &Certificate) -> Result<SpiffeId, X509SvidError> {
    let x509 = parse_der_encoded_bytes_as_x509_certificate(cert.as_bytes())?;
    validate_x509_leaf_certificate(&x509)?;
    Ok(extract_single_spiffe_id_from_uri_san(&x509)?)
}

/// Parses and validates `certs` as signing certificates.
pub(super) fn validate_signing_certificates(certs: &[Certificate]) -> Result<(), X509SvidError> {
    for cert in certs {
        let x509 = parse_der_encoded_bytes_as_x509_certificate(cert.as_bytes())?;
        validate_signing_certificate(&x509)?;
    }
    Ok(())
}

fn validate_x509_leaf_certificate(cert: &X509Certificate<'_>) -> Result<(), X509SvidError> {
    validate_leaf_certificate_key_usage(cert)?;

    match get_x509_extension(cert, &oid_registry::OID_X509_EXT_BASIC_CONSTRAINTS)? {
        ParsedExtension::BasicConstraints(b) if b.ca => Err(X509SvidError::LeafCertificateHasCaFlag),
        ParsedExtension::BasicConstraints(_) => Ok(()),
        // Present but malformed.
        _ => Err(X509SvidError::UnparseableExtension {
            extension: "BasicConstraints",
        }),
    }
}

fn validate_signing_certificate(cert: &X509Certificate<'_>) -> Result<(), X509SvidError> {
    match get_x509_extension(cert, &oid_registry::OID_X509_EXT_BASIC_CONSTRAINTS)? {
        ParsedExtension::BasicConstraints(b) if b.ca => {}
        ParsedExtension::BasicConstraints(_) => {
            return Err(X509SvidError::SigningCertificateMissingCaFlag);
        }
        _ => {
            return Err(X509SvidError::UnparseableExtension {
                extension: "BasicConstraints",
            });
        }
    }

    match get_x509_extension(cert, &oid_registry::OID_X509_EXT_KEY_USAGE)? {
        ParsedExtension::KeyUsage(k) if k.key_cert_sign() => Ok(()),
        ParsedExtension::KeyUsage(_) => Err(X509SvidError::SigningCertificateMissingKeyCertSign),
        _ => Err(X509SvidError::UnparseableExtension {
            extension: "KeyUsage",
        }),
    }
}

fn validate_leaf_certificate_key_usage(cert: &X509Certificate<'_>) -> Result<(), X509SvidError> {
    match get_x509_extension(cert, &oid_registry::OID_X509_EXT_KEY_USAGE)? {
        ParsedExtension::KeyUsage(k) if !k.digital_signature() => {
            Err(X509SvidError::LeafCertificateMissingDigitalSignature)
        }
        ParsedExtension::KeyUsage(k) if k.crl_sign() => Err(X509SvidError::LeafCertificateHasCrlSign),
        ParsedExtension::KeyUsage(k) if k.key_cert_sign() => {
            Err(X509SvidError::LeafCertificateHasKeyCertSign)
        }
        ParsedExtension::KeyUsage(_) => Ok(()),
        _ => Err(X509SvidError::UnparseableExtension {
            extension: "KeyUsage",
        }),
    }
}
