use std::fmt;

use super::{Certificate, sha256_fingerprint};
use crate::error::Result;
use crate::key::KeyPair;
use crate::pem_utils::{CERTIFICATE_LABEL, PRIVATE_KEY_LABEL, der_to_pem};

/// The encoded output for one certificate subject.
///
/// Both the DER and PEM forms of the certificate and of its PKCS#8 private key are kept, since
/// TLS test servers read the PEM files while verifiers tend to want DER. The material is
/// immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct CertificateMaterial {
    certificate_der: Vec<u8>,
    certificate_pem: String,
    private_key_der: Vec<u8>,
    private_key_pem: String,
}

impl CertificateMaterial {
    /// Encodes `certificate` and `key`. Any failure here is an encoding error: the certificate
    /// itself was already signed.
    pub fn encode(certificate: &Certificate, key: &KeyPair) -> Result<Self> {
        let certificate_der = certificate.to_der()?;
        let private_key_der = key.to_pkcs8_der()?;
        Ok(Self {
            certificate_pem: der_to_pem(&certificate_der, CERTIFICATE_LABEL),
            private_key_pem: der_to_pem(&private_key_der, PRIVATE_KEY_LABEL),
            certificate_der,
            private_key_der,
        })
    }

    pub fn certificate_der(&self) -> &[u8] {
        &self.certificate_der
    }

    /// PEM block labelled `CERTIFICATE`.
    pub fn certificate_pem(&self) -> &str {
        &self.certificate_pem
    }

    /// PKCS#8 DER of the subject's private key.
    pub fn private_key_der(&self) -> &[u8] {
        &self.private_key_der
    }

    /// PEM block labelled `PRIVATE KEY`.
    pub fn private_key_pem(&self) -> &str {
        &self.private_key_pem
    }

    /// SHA-256 fingerprint of the certificate DER, computed without parsing it.
    pub fn fingerprint(&self) -> String {
        sha256_fingerprint(&self.certificate_der)
    }

    /// Parses the certificate back out of its DER form.
    pub fn certificate(&self) -> Result<Certificate> {
        Certificate::from_der(&self.certificate_der)
    }

    pub fn private_key(&self) -> Result<KeyPair> {
        KeyPair::import_from_pkcs8_der(&self.private_key_der)
    }
}

impl fmt::Debug for CertificateMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateMaterial")
            .field("certificate_pem", &self.certificate_pem)
            .field("private_key", &"<redacted>")
            .finish()
    }
}
