use bon::Builder;
use tracing::debug;
use x509_cert::certificate::CertificateInner;

use crate::cert::material::CertificateMaterial;
use crate::cert::params::CertificateTemplate;
use crate::cert::{Certificate, ecdsa_with_sha256};
use crate::error::{GenCertError, Result};
use crate::key::KeyPair;
use crate::tbs_certificate::TbsCertificate;

/// One invocation of the signer.
///
/// A fresh key pair is generated for `subject` every time the request is signed. When
/// `self_signed` is set that key signs the certificate and `issuer_key` must be absent;
/// otherwise `issuer_key` is required and the subject key is only embedded.
///
/// # Example
/// ```
/// use gencert::cert::params::{CertificateTemplate, Role, Validity};
/// use gencert::issuer::SigningRequest;
///
/// # fn main() -> Result<(), gencert::error::GenCertError> {
/// let validity = Validity::starting_now(time::Duration::days(30))?;
/// let root = CertificateTemplate::for_role(Role::Root, "Acme Co", validity)?;
/// let issued = SigningRequest::self_signed(&root).sign()?;
///
/// let leaf = CertificateTemplate::for_role(Role::Server, "Acme Co", validity)?
///     .with_hosts(&["localhost", "127.0.0.1"]);
/// let leaf_issued = SigningRequest::builder()
///     .subject(&leaf)
///     .issuer(&root)
///     .issuer_key(&issued.key)
///     .build()
///     .sign()?;
/// assert!(leaf_issued.material.certificate_pem().contains("BEGIN CERTIFICATE"));
/// # Ok(())
/// # }
/// ```
#[derive(Builder)]
pub struct SigningRequest<'a> {
    subject: &'a CertificateTemplate,
    issuer: &'a CertificateTemplate,
    #[builder(default)]
    self_signed: bool,
    issuer_key: Option<&'a KeyPair>,
}

/// The result of a successful signing: the encoded material and the subject's private key.
///
/// The key is handed back so that an authority can go on to sign subordinates.
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    pub material: CertificateMaterial,
    pub key: KeyPair,
}

impl IssuedCertificate {
    /// Pairs the issued key with its template so it can sign further certificates.
    pub fn into_authority(self, template: CertificateTemplate) -> (CertificateMaterial, Authority) {
        let authority = Authority {
            template,
            key: self.key,
        };
        (self.material, authority)
    }
}

impl<'a> SigningRequest<'a> {
    /// A request for a root certificate that names and signs itself.
    pub fn self_signed(subject: &'a CertificateTemplate) -> Self {
        Self {
            subject,
            issuer: subject,
            self_signed: true,
            issuer_key: None,
        }
    }

    /// Checks the argument combination before any key material is generated.
    fn validate(&self) -> Result<()> {
        match (self.self_signed, self.issuer_key) {
            (true, Some(_)) => Err(GenCertError::UsageError(
                "an issuer key must not be supplied for a self-signed certificate".to_string(),
            )),
            (false, None) => Err(GenCertError::UsageError(
                "an issuer key is required for a certificate signed by another authority"
                    .to_string(),
            )),
            (true, None) if self.issuer.subject != self.subject.subject => {
                Err(GenCertError::UsageError(
                    "a self-signed certificate must name its own subject as issuer".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Generates the subject key pair and produces the signed certificate.
    ///
    /// Nothing is returned unless every step succeeds.
    pub fn sign(self) -> Result<IssuedCertificate> {
        self.validate()?;

        let subject_key = KeyPair::generate()?;
        let signing_key = match self.issuer_key {
            Some(issuer_key) => issuer_key,
            None => &subject_key,
        };

        debug!(
            role = ?self.subject.role,
            serial = %self.subject.serial_number,
            self_signed = self.self_signed,
            "signing certificate"
        );

        let certificate = self
            .forge(&subject_key, signing_key)
            .map_err(|e| match e {
                GenCertError::CertificateError(_)
                | GenCertError::RandomnessError(_)
                | GenCertError::KeyGenerationError(_) => e,
                other => GenCertError::CertificateError(other.to_string()),
            })?;

        let material = CertificateMaterial::encode(&certificate, &subject_key)?;
        Ok(IssuedCertificate {
            material,
            key: subject_key,
        })
    }

    /// Builds the TBS structure and signs it with `signing_key`.
    fn forge(&self, subject_key: &KeyPair, signing_key: &KeyPair) -> Result<Certificate> {
        let authority_key_id = if self.self_signed {
            None
        } else {
            Some(signing_key.public_key().key_identifier()?)
        };

        let tbs_cert = TbsCertificate {
            serial_number: self.subject.serial_number,
            issuer: self.issuer.subject.clone(),
            validity: self.subject.validity,
            subject: self.subject.subject.clone(),
            subject_public_key: subject_key.public_key(),
            extensions: self
                .subject
                .extensions(&subject_key.public_key(), authority_key_id)?,
        };

        let tbs_cert_inner = tbs_cert.to_tbs_certificate_inner()?;
        let tbs_der = der::Encode::to_der(&tbs_cert_inner)?;
        let signature = signing_key.sign_data(&tbs_der)?;

        let cert_inner = CertificateInner {
            tbs_certificate: tbs_cert_inner,
            signature_algorithm: ecdsa_with_sha256(),
            signature: der::asn1::BitString::from_bytes(&signature)?,
        };

        Ok(Certificate { inner: cert_inner })
    }
}

/// Represents an entity capable of issuing certificates.
pub trait Issuer {
    /// The template the issuer's own certificate was built from.
    fn template(&self) -> &CertificateTemplate;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Issues a certificate for `subject`, signed with this issuer's key.
    fn issue(&self, subject: &CertificateTemplate) -> Result<IssuedCertificate> {
        SigningRequest::builder()
            .subject(subject)
            .issuer(self.template())
            .issuer_key(self.signing_key())
            .build()
            .sign()
    }
}

/// A certificate authority held in memory: its template and private key.
#[derive(Debug, Clone)]
pub struct Authority {
    pub template: CertificateTemplate,
    pub key: KeyPair,
}

impl Authority {
    /// Self-signs `template` and returns the root's material together with the authority.
    pub fn new_root(template: CertificateTemplate) -> Result<(CertificateMaterial, Self)> {
        let issued = SigningRequest::self_signed(&template).sign()?;
        Ok(issued.into_authority(template))
    }

    /// Issues a subordinate authority for `template` signed by this one.
    pub fn new_subordinate(
        &self,
        template: CertificateTemplate,
    ) -> Result<(CertificateMaterial, Authority)> {
        if !template.is_ca() {
            return Err(GenCertError::UsageError(format!(
                "{:?} certificates cannot act as an authority",
                template.role
            )));
        }
        Ok(self.issue(&template)?.into_authority(template))
    }
}

impl Issuer for Authority {
    fn template(&self) -> &CertificateTemplate {
        &self.template
    }

    fn signing_key(&self) -> &KeyPair {
        &self.key
    }
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::*;
    use crate::cert::extensions::ExtendedKeyUsageOption;
    use crate::cert::params::{Role, Validity};

    fn template(role: Role) -> CertificateTemplate {
        let validity = Validity::starting_now(Duration::hours(8760)).unwrap();
        CertificateTemplate::for_role(role, "Acme Co", validity).unwrap()
    }

    #[test]
    fn test_self_signed_with_issuer_key_is_rejected() {
        let root = template(Role::Root);
        let stray_key = KeyPair::generate().unwrap();
        let result = SigningRequest::builder()
            .subject(&root)
            .issuer(&root)
            .self_signed(true)
            .issuer_key(&stray_key)
            .build()
            .sign();
        assert!(matches!(result, Err(GenCertError::UsageError(_))));
    }

    #[test]
    fn test_subordinate_without_issuer_key_is_rejected() {
        let root = template(Role::Root);
        let leaf = template(Role::Server);
        let result = SigningRequest::builder()
            .subject(&leaf)
            .issuer(&root)
            .build()
            .sign();
        assert!(matches!(result, Err(GenCertError::UsageError(_))));
    }

    #[test]
    fn test_self_signed_with_foreign_issuer_is_rejected() {
        let root = template(Role::Root);
        let other = template(Role::Root);
        let result = SigningRequest::builder()
            .subject(&root)
            .issuer(&other)
            .self_signed(true)
            .build()
            .sign();
        assert!(matches!(result, Err(GenCertError::UsageError(_))));
    }

    #[test]
    fn test_root_is_self_signed_authority() {
        let root = template(Role::Root);
        let issued = SigningRequest::self_signed(&root).sign().unwrap();
        let cert = issued.material.certificate().unwrap();

        assert!(cert.is_self_issued());
        assert!(cert.is_ca().unwrap());
        assert_eq!(cert.serial_number().unwrap(), root.serial_number);
        assert_eq!(cert.subject(), root.subject);
        assert_eq!(cert.public_key().unwrap(), issued.key.public_key());
        cert.verify_signed_by(&issued.key.public_key()).unwrap();
        assert_eq!(
            cert.extended_key_usage().unwrap().usage,
            vec![
                ExtendedKeyUsageOption::ServerAuth,
                ExtendedKeyUsageOption::ClientAuth
            ]
        );
    }

    #[test]
    fn test_subordinate_is_signed_by_issuer_key_only() {
        let (_, root) = Authority::new_root(template(Role::Root)).unwrap();
        let leaf = template(Role::Server).with_hosts(&["localhost", "127.0.0.1"]);
        let issued = root.issue(&leaf).unwrap();
        let cert = issued.material.certificate().unwrap();

        assert!(!cert.is_ca().unwrap());
        assert_eq!(cert.issuer(), root.template.subject);
        assert_eq!(cert.public_key().unwrap(), issued.key.public_key());
        cert.verify_signed_by(&root.key.public_key()).unwrap();
        assert!(matches!(
            cert.verify_signed_by(&issued.key.public_key()),
            Err(GenCertError::VerificationError(_))
        ));
        assert!(
            cert.verify_signed_by(&KeyPair::generate().unwrap().public_key())
                .is_err()
        );
    }

    #[test]
    fn test_subordinate_authority_chain() {
        let (_, root) = Authority::new_root(template(Role::Root)).unwrap();
        let (intermediate_material, intermediate) = root
            .new_subordinate(template(Role::ServerIntermediate))
            .unwrap();
        let leaf = template(Role::Server).with_hosts(&["server1.local"]);
        let leaf_cert = intermediate.issue(&leaf).unwrap().material.certificate().unwrap();

        let intermediate_cert = intermediate_material.certificate().unwrap();
        intermediate_cert
            .verify_signed_by(&root.key.public_key())
            .unwrap();
        leaf_cert
            .verify_signed_by(&intermediate.key.public_key())
            .unwrap();
        assert!(leaf_cert.verify_signed_by(&root.key.public_key()).is_err());
        assert_eq!(leaf_cert.issuer(), intermediate_cert.subject());
    }

    #[test]
    fn test_leaf_cannot_become_authority() {
        let (_, root) = Authority::new_root(template(Role::Root)).unwrap();
        assert!(matches!(
            root.new_subordinate(template(Role::Client)),
            Err(GenCertError::UsageError(_))
        ));
    }

    #[test]
    fn test_material_pem_decodes_to_der() {
        let root = template(Role::Root);
        let issued = SigningRequest::self_signed(&root).sign().unwrap();
        let material = &issued.material;

        let cert = pem::parse(material.certificate_pem()).unwrap();
        assert_eq!(cert.tag(), "CERTIFICATE");
        assert_eq!(cert.contents(), material.certificate_der());

        let key = pem::parse(material.private_key_pem()).unwrap();
        assert_eq!(key.tag(), "PRIVATE KEY");
        assert_eq!(key.contents(), material.private_key_der());
        assert_eq!(
            material.private_key().unwrap().public_key(),
            issued.key.public_key()
        );
    }
}
