use der::asn1::{GeneralizedTime, OctetString, UtcTime};
use der::DateTime;
use time::OffsetDateTime;
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::serial_number::SerialNumber;

use crate::cert::ecdsa_with_sha256;
use crate::cert::params::{DistinguishedName, ExtensionParam, Validity};
use crate::error::{GenCertError, Result};
use crate::key::PublicKey;

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
/// This struct contains all the fields required to generate a valid X.509 certificate.
///
/// # Fields
/// * `serial_number` - The unique identifier for the certificate.
/// * `issuer` - The distinguished name of the certificate issuer.
/// * `validity` - The certificate's validity period.
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `extensions` - Additional X.509 extensions for the certificate.
pub struct TbsCertificate {
    pub serial_number: u128,
    pub issuer: DistinguishedName,
    pub validity: Validity,
    pub subject: DistinguishedName,
    pub subject_public_key: PublicKey,
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Converts the `TbsCertificate` into a `TbsCertificateInner` for DER encoding.
    ///
    /// The signature algorithm is always ecdsa-with-SHA256.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner> {
        let extensions = self
            .extensions
            .iter()
            .map(|ext| -> Result<x509_cert::ext::Extension> {
                Ok(x509_cert::ext::Extension {
                    extn_id: ext.oid,
                    critical: ext.critical,
                    extn_value: OctetString::new(ext.value.clone())?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let validity = x509_cert::time::Validity {
            not_before: to_x509_time(self.validity.not_before)?,
            not_after: to_x509_time(self.validity.not_after)?,
        };

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number: SerialNumber::new(&serial_number_bytes(self.serial_number))?,
            signature: ecdsa_with_sha256(),
            issuer: self.issuer.as_x509_name()?,
            validity,
            subject: self.subject.as_x509_name()?,
            subject_public_key_info: self.subject_public_key.as_spki()?,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: Some(extensions),
        })
    }
}

/// Minimal two's complement big-endian encoding of a non-negative serial, as the ASN.1 INTEGER
/// content octets.
pub(crate) fn serial_number_bytes(serial: u128) -> Vec<u8> {
    let bytes = serial.to_be_bytes();
    let first = bytes
        .iter()
        .position(|b| *b != 0)
        .unwrap_or(bytes.len() - 1);
    let mut encoded = Vec::with_capacity(17);
    if bytes[first] & 0x80 != 0 {
        encoded.push(0);
    }
    encoded.extend_from_slice(&bytes[first..]);
    encoded
}

/// Inverse of [`serial_number_bytes`]; tolerates the leading zero octet.
pub(crate) fn serial_number_from_bytes(bytes: &[u8]) -> Result<u128> {
    let significant: &[u8] = match bytes.iter().position(|b| *b != 0) {
        Some(first) => &bytes[first..],
        None => &[],
    };
    if significant.len() > 16 {
        return Err(GenCertError::DecodingError(format!(
            "serial number of {} bytes does not fit in 128 bits",
            significant.len()
        )));
    }
    let mut buf = [0u8; 16];
    buf[16 - significant.len()..].copy_from_slice(significant);
    Ok(u128::from_be_bytes(buf))
}

/// RFC 5280 section 4.1.2.5: UTCTime through 2049, GeneralizedTime from 2050 on.
fn to_x509_time(at: OffsetDateTime) -> Result<x509_cert::time::Time> {
    let seconds = u64::try_from(at.unix_timestamp()).map_err(|_| {
        GenCertError::CertificateError(format!("{at} is before the Unix epoch"))
    })?;
    let date_time = DateTime::from_unix_duration(std::time::Duration::from_secs(seconds))?;
    if date_time.year() < 2050 {
        Ok(x509_cert::time::Time::UtcTime(UtcTime::from_date_time(
            date_time,
        )?))
    } else {
        Ok(x509_cert::time::Time::GeneralTime(
            GeneralizedTime::from_date_time(date_time),
        ))
    }
}
