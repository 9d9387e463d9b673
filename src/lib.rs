//! # gencert - Test PKI Generation in Pure Rust
//!
//! gencert issues a self-contained certificate hierarchy for TLS test environments: a
//! self-signed root certificate authority, server and client certificates signed under it, and
//! the matching private keys. It is built on the RustCrypto `x509-cert`, `p256` and `der`
//! crates, with no OpenSSL or ring dependency.
//!
//! ## Keys and Formats
//!
//! - Every subject gets a fresh **ECDSA P-256** key pair; certificates are signed with
//!   ecdsa-with-SHA256.
//! - Certificates are produced as **DER** and as **PEM** blocks labelled `CERTIFICATE`.
//! - Private keys are produced as **PKCS#8** DER and as PEM blocks labelled `PRIVATE KEY`.
//!
//! ## Quick Start
//!
//! ### Generating a root, server and client certificate
//!
//! ```rust,no_run
//! use gencert::chain::{ChainConfig, generate};
//!
//! # fn main() -> Result<(), gencert::error::GenCertError> {
//! let config = ChainConfig::builder()
//!     .hosts(vec!["localhost".to_string(), "127.0.0.1".to_string()])
//!     .organization("Acme Co".to_string())
//!     .valid_for(time::Duration::hours(8760))
//!     .build();
//!
//! let chain = generate(&config)?;
//! for entry in chain.iter() {
//!     println!("{}:\n{}", entry.name, entry.material.certificate_pem());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Building a chain by hand
//!
//! ```rust,no_run
//! use gencert::{
//!     cert::params::{CertificateTemplate, Role, Validity},
//!     issuer::{Authority, Issuer},
//! };
//!
//! # fn main() -> Result<(), gencert::error::GenCertError> {
//! let validity = Validity::starting_now(time::Duration::days(30))?;
//!
//! let (root_material, root) =
//!     Authority::new_root(CertificateTemplate::for_role(Role::Root, "Acme Co", validity)?)?;
//! let (_, servers) = root.new_subordinate(CertificateTemplate::for_role(
//!     Role::ServerIntermediate,
//!     "Acme Co",
//!     validity,
//! )?)?;
//!
//! let leaf = CertificateTemplate::for_role(Role::Server, "Acme Co", validity)?
//!     .with_common_name("server1.local")
//!     .with_hosts(&["server1.local", "10.0.0.5"]);
//! let issued = servers.issue(&leaf)?;
//!
//! println!("{}", root_material.certificate_pem());
//! println!("{}", issued.material.private_key_pem());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Each stage of signing fails with its own variant of [`error::GenCertError`]:
//!
//! ```rust
//! use gencert::{error::GenCertError, key::KeyPair};
//!
//! match KeyPair::import_from_pkcs8_pem("invalid pem data") {
//!     Ok(_) => println!("Key imported successfully"),
//!     Err(GenCertError::DecodingError(msg)) => println!("Failed to decode key: {}", msg),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`chain`]: Assembles root, intermediate, server and client certificates into one run
//! - [`issuer`]: The signer and the in-memory certificate authority
//! - [`cert`]: Certificate templates, extensions, encoded material and inspection
//! - [`key`]: P-256 key generation, PKCS#8 import/export and signatures
//! - [`tbs_certificate`]: Low-level certificate structure construction
//! - [`pem_utils`]: PEM wrapping of DER documents
//! - [`error`]: Error types

pub mod cert;
pub mod chain;
pub mod error;
pub mod issuer;
pub mod key;
pub mod pem_utils;
pub mod tbs_certificate;
