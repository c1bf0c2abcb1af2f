//! `Certificate` and `PrivateKey` types and helpers.
//!
//! These types wrap DER-encoded bytes and validate them at construction time.

use crate::cert::error::{CertificateError, PrivateKeyError};
use crate::cert::parsing::{
    extract_single_spiffe_id_from_uri_san, parse_der_encoded_bytes_as_x509_certificate,
};
use crate::SpiffeId;
use pkcs8::PrivateKeyInfo;
use time::OffsetDateTime;
use zeroize::Zeroize;

pub mod error;
pub(crate) mod parsing;

/// A single DER-encoded X.509 certificate.
///
/// Invariant: instances are always parseable DER-encoded X.509.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Certificate(Vec<u8>);

impl Certificate {
    /// Returns the certificate bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the end of the certificate's validity period (`notAfter`).
    ///
    /// # Errors
    ///
    /// Returns [`CertificateError::ParseX509Certificate`] if the bytes cannot be parsed.
    pub fn not_after(&self) -> Result<OffsetDateTime, CertificateError> {
        let x509 = parse_der_encoded_bytes_as_x509_certificate(self.as_bytes())?;
        Ok(x509.validity().not_after.to_datetime())
    }

    /// Extracts the SPIFFE ID from the certificate's URI SAN.
    ///
    /// The certificate must contain exactly one URI SAN that parses as a SPIFFE ID.
    ///
    /// # Errors
    ///
    /// - [`CertificateError::MissingSpiffeId`] if no SPIFFE ID is present in the URI SAN.
    /// - [`CertificateError::MultipleSpiffeIds`] if multiple SPIFFE IDs are present.
    /// - [`CertificateError::ParseX509Certificate`] for parsing errors.
    pub fn spiffe_id(&self) -> Result<SpiffeId, CertificateError> {
        let x509 = parse_der_encoded_bytes_as_x509_certificate(self.as_bytes())?;
        extract_single_spiffe_id_from_uri_san(&x509)
    }
}

impl AsRef<[u8]> for Certificate {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Certificate {
    type Error = CertificateError;

    fn try_from(der_bytes: &[u8]) -> Result<Self, Self::Error> {
        parse_der_encoded_bytes_as_x509_certificate(der_bytes)?;
        Ok(Self(Vec::from(der_bytes)))
    }
}

impl TryFrom<Vec<u8>> for Certificate {
    type Error = CertificateError;

    fn try_from(der_bytes: Vec<u8>) -> Result<Self, Self::Error> {
        parse_der_encoded_bytes_as_x509_certificate(&der_bytes)?;
        Ok(Self(der_bytes))
    }
}

/// A DER-encoded private key in PKCS#8 format.
///
/// Invariant: instances are always parseable PKCS#8.
///
/// This type is zeroized on drop and its `Debug` output never includes the key bytes.
#[derive(Clone, Eq, PartialEq, Zeroize)]
#[zeroize(drop)]
pub struct PrivateKey(Vec<u8>);

impl PrivateKey {
    /// Returns the private key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for PrivateKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for PrivateKey {
    type Error = PrivateKeyError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        PrivateKeyInfo::try_from(bytes).map_err(PrivateKeyError::DecodePkcs8)?;
        Ok(Self(Vec::from(bytes)))
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("len", &self.0.len())
            .finish()
    }
}
