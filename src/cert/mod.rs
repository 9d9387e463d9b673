pub mod extensions;
pub mod material;
pub mod params;

use der::{Decode, Encode};
use extensions::{
    BasicConstraints, ExtendedKeyUsage, SubjectAltName, SubjectKeyIdentifier,
    ToAndFromX509Extension,
};
use params::{DistinguishedName, ExtensionParam, Validity};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use x509_cert::certificate::CertificateInner;
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::error::{GenCertError, Result};
use crate::key::PublicKey;
use crate::pem_utils::{CERTIFICATE_LABEL, der_to_pem, pem_to_der};
use crate::tbs_certificate::serial_number_from_bytes;

/// The signature algorithm of every certificate this crate issues: ECDSA over P-256 with
/// SHA-256. Parameters are absent, as RFC 5758 requires.
pub fn ecdsa_with_sha256() -> AlgorithmIdentifierOwned {
    AlgorithmIdentifierOwned {
        oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_256,
        parameters: None,
    }
}

/// Represents an X.509 certificate.
///
/// This struct provides methods to encode the certificate into DER or PEM formats and to
/// inspect the fields the generator sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| GenCertError::EncodingError(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        Ok(der_to_pem(&self.to_der()?, CERTIFICATE_LABEL))
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = CertificateInner::from_der(der)
            .map_err(|e| GenCertError::DecodingError(e.to_string()))?;
        Ok(Self { inner })
    }

    pub fn from_pem(pem: &str) -> Result<Self> {
        Self::from_der(&pem_to_der(pem, CERTIFICATE_LABEL)?)
    }

    pub fn serial_number(&self) -> Result<u128> {
        serial_number_from_bytes(self.inner.tbs_certificate.serial_number.as_bytes())
    }

    pub fn subject(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.subject)
    }

    pub fn issuer(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.issuer)
    }

    /// True when the encoded issuer and subject names are identical.
    pub fn is_self_issued(&self) -> bool {
        self.inner.tbs_certificate.issuer == self.inner.tbs_certificate.subject
    }

    pub fn validity(&self) -> Result<Validity> {
        let validity = &self.inner.tbs_certificate.validity;
        Ok(Validity {
            not_before: from_x509_time(validity.not_before)?,
            not_after: from_x509_time(validity.not_after)?,
        })
    }

    pub fn extensions(&self) -> Vec<ExtensionParam> {
        self.inner
            .tbs_certificate
            .extensions
            .iter()
            .flatten()
            .map(|ext| ExtensionParam {
                oid: ext.extn_id,
                critical: ext.critical,
                value: ext.extn_value.as_bytes().to_vec(),
            })
            .collect()
    }

    /// Decodes the extension of type `E`, if the certificate carries one.
    pub fn extension<E: ToAndFromX509Extension>(&self) -> Result<Option<E>> {
        self.extensions()
            .iter()
            .find(|ext| ext.oid == E::OID)
            .map(|ext| ext.to_extension::<E>())
            .transpose()
    }

    pub fn is_ca(&self) -> Result<bool> {
        Ok(self
            .extension::<BasicConstraints>()?
            .is_some_and(|bc| bc.is_ca))
    }

    pub fn extended_key_usage(&self) -> Result<ExtendedKeyUsage> {
        Ok(self.extension::<ExtendedKeyUsage>()?.unwrap_or_default())
    }

    pub fn subject_alt_names(&self) -> Result<SubjectAltName> {
        Ok(self.extension::<SubjectAltName>()?.unwrap_or_default())
    }

    pub fn subject_key_identifier(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.extension::<SubjectKeyIdentifier>()?.map(|ski| ski.0))
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_x509spki(&self.inner.tbs_certificate.subject_public_key_info)
    }

    /// Verifies the certificate signature against `issuer_key`.
    pub fn verify_signed_by(&self, issuer_key: &PublicKey) -> Result<()> {
        if self.inner.signature_algorithm != ecdsa_with_sha256() {
            return Err(GenCertError::VerificationError(format!(
                "unsupported signature algorithm {}",
                self.inner.signature_algorithm.oid
            )));
        }
        let tbs = self
            .inner
            .tbs_certificate
            .to_der()
            .map_err(|e| GenCertError::EncodingError(e.to_string()))?;
        issuer_key.verify(&tbs, self.inner.signature.raw_bytes())
    }

    /// SHA-256 fingerprint of the DER encoding, as colon separated upper-case hex.
    pub fn fingerprint(&self) -> Result<String> {
        Ok(sha256_fingerprint(&self.to_der()?))
    }
}

pub(crate) fn sha256_fingerprint(der: &[u8]) -> String {
    Sha256::digest(der)
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}

fn from_x509_time(time: x509_cert::time::Time) -> Result<OffsetDateTime> {
    let seconds = i64::try_from(time.to_unix_duration().as_secs())
        .map_err(|e| GenCertError::DecodingError(e.to_string()))?;
    OffsetDateTime::from_unix_timestamp(seconds)
        .map_err(|e| GenCertError::DecodingError(e.to_string()))
}
