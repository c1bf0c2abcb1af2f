//! X.509-SVID types.

mod validations;

use std::sync::Arc;

use crate::cert::error::{CertificateError, PrivateKeyError};
use crate::cert::parsing::to_certificate_vec;
use crate::cert::{Certificate, PrivateKey};
use crate::spiffe_id::SpiffeId;
use crate::svid::x509::validations::{validate_leaf_certificate, validate_signing_certificates};

/// This type represents a [SPIFFE X509-SVID](https://github.com/spiffe/spiffe/blob/main/standards/X509-SVID.md).
///
/// Contains a [`SpiffeId`], a certificate chain as a vec of DER-encoded X.509 certificates,
/// a private key as a DER-encoded ASN.1 in PKCS#8 format, and the optional hint the
/// Workload API attached to it.
///
/// Invariant: the certificate chain is never empty.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct X509Svid {
    spiffe_id: SpiffeId,
    cert_chain: Vec<Certificate>,
    private_key: PrivateKey,
    hint: Option<Arc<str>>,
}

/// An error that may arise trying to parse a [`X509Svid`] from a `DER` encoded
/// chain of certificates and private key.
#[derive(Debug, thiserror::Error, PartialEq)]
#[non_exhaustive]
pub enum X509SvidError {
    /// The chain of certificates is empty.
    #[error("no certificates found in chain")]
    EmptyChain,

    /// 'CA' flag not allowed in leaf certificate.
    #[error("leaf certificate must not have CA flag set to true")]
    LeafCertificateHasCaFlag,

    /// 'cRLSign' not allowed as key usage in leaf certificate.
    #[error("leaf certificate must not have 'cRLSign' set as key usage")]
    LeafCertificateHasCrlSign,

    /// 'keyCertSign' not allowed as key usage in leaf certificate.
    #[error("leaf certificate must not have 'keyCertSign' set as key usage")]
    LeafCertificateHasKeyCertSign,

    /// 'digitalSignature' as key usage must be present in leaf certificate.
    #[error("leaf certificate must have 'digitalSignature' set as key usage")]
    LeafCertificateMissingDigitalSignature,

    /// 'CA' flag must be set in intermediate certificate.
    #[error("signing certificate must have CA flag set to true")]
    SigningCertificateMissingCaFlag,

    /// 'keyCertSign' as key usage must be present in intermediate certificate.
    #[error("signing certificate must have 'keyCertSign' set as key usage")]
    SigningCertificateMissingKeyCertSign,

    /// An extension is present but its content could not be parsed.
    #[error("X.509 extension could not be parsed: {extension}")]
    UnparseableExtension {
        /// Name of the extension.
        extension: &'static str,
    },

    /// Error processing or validating the X.509 certificates.
    #[error(transparent)]
    Certificate(#[from] CertificateError),

    /// Error processing the private key.
    #[error(transparent)]
    PrivateKey(#[from] PrivateKeyError),
}

impl X509Svid {
    /// Creates a `X509Svid` from certificate chain and key ASN.1 DER-encoded data (binary format).
    ///
    /// # Arguments
    ///
    /// * `cert_chain_der` - Slice of bytes representing a chain of certificates as ASN.1 DER-encoded
    ///   (concatenated with no intermediate padding if there are more than one certificate).
    ///
    /// * `private_key_der` - Slice of bytes representing a private key as ASN.1 DER in PKCS#8 format.
    ///
    /// # Errors
    ///
    /// Returns [`X509SvidError::EmptyChain`] if `cert_chain_der` holds no certificate, or
    /// another [`X509SvidError`] variant if the inputs cannot be parsed or validated.
    pub fn parse_from_der(
        cert_chain_der: &[u8],
        private_key_der: &[u8],
    ) -> Result<Self, X509SvidError> {
        Self::parse_from_der_with_hint(cert_chain_der, private_key_der, None)
    }

    /// Same as [`X509Svid::parse_from_der`], attaching the operator-provided `hint`.
    ///
    /// # Errors
    ///
    /// See [`X509Svid::parse_from_der`].
    pub fn parse_from_der_with_hint(
        cert_chain_der: &[u8],
        private_key_der: &[u8],
        hint: Option<Arc<str>>,
    ) -> Result<Self, X509SvidError> {
        let cert_chain = to_certificate_vec(cert_chain_der)?;

        let leaf = cert_chain.first().ok_or(X509SvidError::EmptyChain)?;

        let spiffe_id = validate_leaf_certificate(leaf)?;
        validate_signing_certificates(&cert_chain[1..])?;
        let private_key = PrivateKey::try_from(private_key_der)?;

        Ok(Self {
            spiffe_id,
            cert_chain,
            private_key,
            hint,
        })
    }

    /// Returns the [`SpiffeId`] of the `X509Svid`.
    pub fn spiffe_id(&self) -> &SpiffeId {
        &self.spiffe_id
    }

    /// Returns the chain of [`Certificate`] of the `X509Svid`. The first certificate in the
    /// chain is the leaf certificate.
    pub fn cert_chain(&self) -> &[Certificate] {
        &self.cert_chain
    }

    /// Returns the leaf certificate of the chain.
    pub fn leaf(&self) -> &Certificate {
        // Construction rejects empty chains.
        &self.cert_chain[0]
    }

    /// Returns the private key of the `X509Svid`.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Returns the hint attached by the Workload API, if any.
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }
}
