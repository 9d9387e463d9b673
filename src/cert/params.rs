use bon::Builder;
use const_oid::ObjectIdentifier;
use der::Tag;
use der::asn1::{Any, SetOfVec};
use rand_core::{OsRng, RngCore};
use time::{Duration, OffsetDateTime};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{RdnSequence, RelativeDistinguishedName};

use super::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, FlagSet, KeyUsage, KeyUsages,
    SubjectAltName, SubjectKeyIdentifier, ToAndFromX509Extension,
};
pub use crate::cert::extensions::ExtendedKeyUsageOption;
use crate::error::{GenCertError, Result};
use crate::key::PublicKey;

/// The position a certificate takes in the generated hierarchy.
///
/// The role alone decides the authority flag, key usage bits and extended key usages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Self-signed trust anchor, able to sign both server and client chains.
    Root,
    /// Authority issuing server certificates.
    ServerIntermediate,
    /// Authority issuing client certificates.
    ClientIntermediate,
    /// TLS server (leaf) certificate.
    Server,
    /// TLS client certificate.
    Client,
}

impl Role {
    pub fn is_ca(self) -> bool {
        matches!(
            self,
            Role::Root | Role::ServerIntermediate | Role::ClientIntermediate
        )
    }

    /// Digital signature is always set; certificate signing only for authorities.
    pub fn key_usage(self) -> KeyUsage {
        let mut flags: FlagSet<KeyUsages> = KeyUsages::DigitalSignature.into();
        if self.is_ca() {
            flags |= KeyUsages::KeyCertSign;
        }
        KeyUsage(flags)
    }

    pub fn extended_key_usage(self) -> ExtendedKeyUsage {
        let usage = match self {
            Role::Root => vec![
                ExtendedKeyUsageOption::ServerAuth,
                ExtendedKeyUsageOption::ClientAuth,
            ],
            Role::ServerIntermediate | Role::Server => vec![ExtendedKeyUsageOption::ServerAuth],
            Role::ClientIntermediate | Role::Client => vec![ExtendedKeyUsageOption::ClientAuth],
        };
        ExtendedKeyUsage { usage }
    }

    /// Intermediates may only sign leaves.
    pub fn max_path_length(self) -> Option<u8> {
        match self {
            Role::ServerIntermediate | Role::ClientIntermediate => Some(0),
            _ => None,
        }
    }
}

/// Distinguished name parameters for building an X.509 certificate.
///
/// This struct represents the subject or issuer name in a certificate.
///
/// # Fields
/// * `organization` - The organization (O).
/// * `common_name` - The common name (CN).
/// * `serial_number` - The serialNumber attribute, restating the certificate serial in decimal.
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    pub organization: Option<String>,
    pub common_name: Option<String>,
    pub serial_number: Option<String>,
}

impl DistinguishedName {
    /// Converts the distinguished name to an X.509-compatible format.
    ///
    /// Attributes are emitted in the order O, CN, serialNumber, each in its own RDN. Absent
    /// attributes are left out.
    pub fn as_x509_name(&self) -> Result<x509_cert::name::DistinguishedName> {
        let attributes = [
            (const_oid::db::rfc4519::O, Tag::Utf8String, &self.organization),
            (const_oid::db::rfc4519::CN, Tag::Utf8String, &self.common_name),
            (
                const_oid::db::rfc4519::SERIAL_NUMBER,
                Tag::PrintableString,
                &self.serial_number,
            ),
        ];

        let mut rdns = Vec::new();
        for (oid, tag, value) in attributes {
            let Some(value) = value else { continue };
            let attribute = AttributeTypeAndValue {
                oid,
                value: Any::new(tag, value.as_bytes())?,
            };
            rdns.push(RelativeDistinguishedName(SetOfVec::try_from(vec![
                attribute,
            ])?));
        }
        Ok(RdnSequence(rdns))
    }

    /// Creates a `DistinguishedName` from an X.509-compatible format.
    ///
    /// Attributes other than O, CN and serialNumber are ignored.
    pub fn from_x509_name(x509dn: &x509_cert::name::DistinguishedName) -> Self {
        let mut dn = DistinguishedName::default();
        for rdn in x509dn.0.iter() {
            for attr in rdn.0.iter() {
                let Ok(value) = std::str::from_utf8(attr.value.value()) else {
                    continue;
                };
                let slot = match attr.oid {
                    const_oid::db::rfc4519::O => &mut dn.organization,
                    const_oid::db::rfc4519::CN => &mut dn.common_name,
                    const_oid::db::rfc4519::SERIAL_NUMBER => &mut dn.serial_number,
                    _ => continue,
                };
                *slot = Some(value.to_string());
            }
        }
        dn
    }
}

/// Certificate validity period.
///
/// This struct represents the `notBefore` and `notAfter` fields in a certificate. Both bounds
/// are whole seconds, the precision X.509 time encodings carry, so the window read back from an
/// encoded certificate equals the one requested.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now (UTC) and lasting `valid_for`.
    pub fn starting_now(valid_for: Duration) -> Result<Self> {
        Self::starting_at(OffsetDateTime::now_utc(), valid_for)
    }

    /// Creates a validity period starting at `not_before` and lasting `valid_for`.
    ///
    /// Sub-second parts of both arguments are dropped. The duration must be at least one
    /// second.
    pub fn starting_at(not_before: OffsetDateTime, valid_for: Duration) -> Result<Self> {
        let valid_for = Duration::seconds(valid_for.whole_seconds());
        if !valid_for.is_positive() {
            return Err(GenCertError::InvalidInput(format!(
                "validity duration must be at least one second, got {valid_for}"
            )));
        }
        let not_before = not_before
            .to_offset(time::UtcOffset::UTC)
            .replace_nanosecond(0)
            .map_err(|e| GenCertError::InvalidInput(e.to_string()))?;
        let not_after = not_before.checked_add(valid_for).ok_or_else(|| {
            GenCertError::InvalidInput(format!("validity of {valid_for} overflows the calendar"))
        })?;
        Ok(Self {
            not_before,
            not_after,
        })
    }

    pub fn duration(&self) -> Duration {
        self.not_after - self.not_before
    }
}

/// Represents an X.509 extension.
///
/// This struct contains the OID, criticality, and value of an extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    pub fn from_extension<E: ToAndFromX509Extension>(extension: E, critical: bool) -> Result<Self> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E> {
        E::from_x509_extension_value(&self.value)
    }
}

/// Draws a certificate serial number uniformly from `[0, 2^128)` using OS randomness.
pub fn random_serial_number() -> Result<u128> {
    let mut bytes = [0u8; 16];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| GenCertError::RandomnessError(format!("serial number: {e}")))?;
    Ok(u128::from_be_bytes(bytes))
}

/// The logical description of one certificate before it is signed.
///
/// # Fields
/// * `role` - Where the certificate sits in the hierarchy.
/// * `serial_number` - The certificate serial number.
/// * `subject` - The subject distinguished name.
/// * `validity` - The validity window.
/// * `subject_alt_names` - DNS names and IP addresses the certificate is valid for.
#[derive(Clone, Debug, Builder, PartialEq, Eq)]
pub struct CertificateTemplate {
    pub role: Role,
    pub serial_number: u128,
    pub subject: DistinguishedName,
    pub validity: Validity,
    #[builder(default)]
    pub subject_alt_names: SubjectAltName,
}

impl CertificateTemplate {
    /// Creates a template for `role` with a fresh random serial. The subject carries the
    /// organization and restates the serial as its serialNumber attribute.
    pub fn for_role(role: Role, organization: &str, validity: Validity) -> Result<Self> {
        let serial_number = random_serial_number()?;
        let subject = DistinguishedName::builder()
            .organization(organization.to_string())
            .serial_number(serial_number.to_string())
            .build();
        Ok(Self::builder()
            .role(role)
            .serial_number(serial_number)
            .subject(subject)
            .validity(validity)
            .build())
    }

    /// Adds the given hosts as subject alternative names, classified into IPs and DNS names.
    pub fn with_hosts<S: AsRef<str>>(mut self, hosts: &[S]) -> Self {
        let classified = SubjectAltName::classify(hosts);
        self.subject_alt_names.dns_names.extend(classified.dns_names);
        self.subject_alt_names
            .ip_addresses
            .extend(classified.ip_addresses);
        self
    }

    pub fn with_common_name(mut self, common_name: &str) -> Self {
        self.subject.common_name = Some(common_name.to_string());
        self
    }

    pub fn is_ca(&self) -> bool {
        self.role.is_ca()
    }

    pub fn key_usage(&self) -> KeyUsage {
        self.role.key_usage()
    }

    pub fn extended_key_usage(&self) -> ExtendedKeyUsage {
        self.role.extended_key_usage()
    }

    /// Builds the extension list for this template.
    ///
    /// `authority_key_id` is the issuer's key identifier and is omitted for self-signed
    /// certificates.
    pub fn extensions(
        &self,
        subject_public_key: &PublicKey,
        authority_key_id: Option<Vec<u8>>,
    ) -> Result<Vec<ExtensionParam>> {
        let basic_constraints = BasicConstraints {
            is_ca: self.is_ca(),
            max_path_length: self.role.max_path_length(),
        };

        let mut extensions = vec![
            ExtensionParam::from_extension(basic_constraints, true)?,
            ExtensionParam::from_extension(self.key_usage(), true)?,
            ExtensionParam::from_extension(self.extended_key_usage(), false)?,
            ExtensionParam::from_extension(
                SubjectKeyIdentifier(subject_public_key.key_identifier()?),
                false,
            )?,
        ];

        if let Some(key_identifier) = authority_key_id {
            extensions.push(ExtensionParam::from_extension(
                AuthorityKeyIdentifier { key_identifier },
                false,
            )?);
        }

        if !self.subject_alt_names.is_empty() {
            extensions.push(ExtensionParam::from_extension(
                self.subject_alt_names.clone(),
                false,
            )?);
        }

        Ok(extensions)
    }
}
