//! use gencert::error::GenCertError;

use thiserror::Error;

/// Represents errors that can occur while generating a certificate chain.
///
/// Each failure stage of the signing pipeline has its own variant so callers can tell a
/// certificate that could not be forged apart from one that was forged but could not be encoded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenCertError {
    /// The operating system could not supply random bytes.
    #[error("Randomness error: {0}")]
    RandomnessError(String),

    /// Error during key generation.
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// The signer was called with an inconsistent combination of arguments.
    #[error("Usage error: {0}")]
    UsageError(String),

    /// Error while constructing or signing a certificate.
    #[error("Certificate error: {0}")]
    CertificateError(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A signature did not verify against the given public key.
    #[error("Signature verification failed: {0}")]
    VerificationError(String),
}

pub type Result<T> = std::result::Result<T, GenCertError>;

impl From<der::Error> for GenCertError {
    /// Converts a `der::Error` raised while building certificate structures.
    fn from(err: der::Error) -> Self {
        GenCertError::CertificateError(err.to_string())
    }
}

impl From<pem::PemError> for GenCertError {
    fn from(err: pem::PemError) -> Self {
        GenCertError::DecodingError(err.to_string())
    }
}
