use crate::error::{GenCertError, Result};

/// PEM label of an X.509 certificate block.
pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// PEM label of a PKCS#8 private key block.
pub const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
///
/// Lines end with `\n` so the output matches what TLS tooling writes on Unix.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(
        &pem,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Convert a PEM‑encoded string to DER‑encoded bytes, checking the block label.
pub fn pem_to_der(pem_str: &str, label: &str) -> Result<Vec<u8>> {
    let pem = pem::parse(pem_str)?;
    if pem.tag() != label {
        return Err(GenCertError::DecodingError(format!(
            "expected PEM block {label}, found {}",
            pem.tag()
        )));
    }
    Ok(pem.contents().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pem_uses_label_and_lf() {
        let pem = der_to_pem(&[0x30, 0x03, 0x02, 0x01, 0x01], CERTIFICATE_LABEL);
        assert!(pem.starts_with("-----BEGIN CERTIFICATE-----\n"));
        assert!(pem.trim_end().ends_with("-----END CERTIFICATE-----"));
        assert!(!pem.contains('\r'));
    }

    #[test]
    fn test_pem_label_mismatch_is_rejected() {
        let pem = der_to_pem(&[1, 2, 3], PRIVATE_KEY_LABEL);
        let err = pem_to_der(&pem, CERTIFICATE_LABEL).unwrap_err();
        assert!(matches!(err, GenCertError::DecodingError(_)));
        assert_eq!(pem_to_der(&pem, PRIVATE_KEY_LABEL).unwrap(), vec![1, 2, 3]);
    }
}
