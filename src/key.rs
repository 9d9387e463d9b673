use std::fmt;

use der::Encode;
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{DerSignature, SigningKey, VerifyingKey};
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey};
use rand_core::{OsRng, RngCore};
use sha1::{Digest, Sha1};
use x509_cert::spki::SubjectPublicKeyInfoOwned;
use zeroize::Zeroizing;

use crate::error::{GenCertError, Result};
use crate::pem_utils::{PRIVATE_KEY_LABEL, der_to_pem, pem_to_der};

/// Draws attempted before key generation gives up on the randomness source.
const MAX_SCALAR_DRAWS: usize = 64;

/// An ECDSA P-256 key pair.
///
/// Every certificate subject gets its own freshly generated key pair; key pairs are never cached
/// or shared between subjects.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("curve", &"P-256")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generate an ECDSA P-256 key pair from operating system randomness.
    ///
    /// A failure to read entropy is reported as [`GenCertError::RandomnessError`]. Draws that are
    /// not a valid scalar for the curve are discarded and drawn again; only a source that keeps
    /// producing invalid scalars is reported as [`GenCertError::KeyGenerationError`].
    pub fn generate() -> Result<Self> {
        Self::generate_with(&mut OsRng)
    }

    fn generate_with<R: RngCore>(rng: &mut R) -> Result<Self> {
        let mut secret = Zeroizing::new(p256::FieldBytes::default());
        for _ in 0..MAX_SCALAR_DRAWS {
            rng.try_fill_bytes(secret.as_mut_slice())
                .map_err(|e| GenCertError::RandomnessError(e.to_string()))?;
            if let Ok(signing_key) = SigningKey::from_bytes(&secret) {
                return Ok(Self { signing_key });
            }
        }
        Err(GenCertError::KeyGenerationError(format!(
            "no valid P-256 scalar in {MAX_SCALAR_DRAWS} draws"
        )))
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(*self.signing_key.verifying_key())
    }

    /// Returns the subject public key info of this key pair.
    pub fn as_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        self.public_key().as_spki()
    }

    /// Signs `data` with ECDSA/SHA-256, returning the DER-encoded `Ecdsa-Sig-Value`.
    pub fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        let signature: DerSignature = self
            .signing_key
            .try_sign(data)
            .map_err(|e| GenCertError::CertificateError(e.to_string()))?;
        Ok(signature.as_bytes().to_vec())
    }

    /// Exports the private key as a PKCS#8 DER document.
    pub fn to_pkcs8_der(&self) -> Result<Vec<u8>> {
        let document = self
            .signing_key
            .to_pkcs8_der()
            .map_err(|e| GenCertError::EncodingError(e.to_string()))?;
        Ok(document.as_bytes().to_vec())
    }

    /// Exports the private key as a PEM block labelled `PRIVATE KEY`.
    pub fn to_pkcs8_pem(&self) -> Result<String> {
        Ok(der_to_pem(&self.to_pkcs8_der()?, PRIVATE_KEY_LABEL))
    }

    pub fn import_from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let signing_key = SigningKey::from_pkcs8_der(der)
            .map_err(|e| GenCertError::DecodingError(e.to_string()))?;
        Ok(Self { signing_key })
    }

    pub fn import_from_pkcs8_pem(pem: &str) -> Result<Self> {
        Self::import_from_pkcs8_der(&pem_to_der(pem, PRIVATE_KEY_LABEL)?)
    }
}

/// The public half of a [`KeyPair`], as embedded in a certificate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// Encodes the key as an X.509 `SubjectPublicKeyInfo`.
    pub fn as_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        SubjectPublicKeyInfoOwned::from_key(self.0)
            .map_err(|e| GenCertError::EncodingError(e.to_string()))
    }

    /// Decodes a P-256 key from an X.509 `SubjectPublicKeyInfo`.
    pub fn from_x509spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        let der = spki
            .to_der()
            .map_err(|e| GenCertError::DecodingError(e.to_string()))?;
        let verifying_key = VerifyingKey::from_public_key_der(&der)
            .map_err(|e| GenCertError::DecodingError(e.to_string()))?;
        Ok(Self(verifying_key))
    }

    /// Key identifier as described in RFC 5280 section 4.2.1.2, method 1: the SHA-1 hash of the
    /// subject public key bits.
    pub fn key_identifier(&self) -> Result<Vec<u8>> {
        let spki = self.as_spki()?;
        Ok(Sha1::digest(spki.subject_public_key.raw_bytes()).to_vec())
    }

    /// Verifies a DER-encoded ECDSA/SHA-256 signature over `data`.
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> Result<()> {
        let signature = DerSignature::from_bytes(signature)
            .map_err(|e| GenCertError::VerificationError(e.to_string()))?;
        self.0
            .verify(data, &signature)
            .map_err(|e| GenCertError::VerificationError(e.to_string()))
    }
}
