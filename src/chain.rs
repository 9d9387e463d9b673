//! Assembles a complete certificate hierarchy from a [`ChainConfig`].
//!
//! Two shapes are supported:
//!
//! - [`ChainShape::Flat`]: a root plus one server (`leaf`) and one `client` certificate, both
//!   signed by the root and both carrying the configured hosts as subject alternative names.
//! - [`ChainShape::Tiered`]: a root, a server and a client intermediate signed by the root, and
//!   one leaf per configured server or client name signed by the matching intermediate.
//!
//! Every certificate of a run shares one validity window, computed when the run starts. The
//! first failure aborts the run and nothing generated so far is returned.

use bon::Builder;
use time::Duration;
use tracing::{info, warn};

use crate::cert::material::CertificateMaterial;
use crate::cert::params::{CertificateTemplate, Role, Validity};
use crate::error::{GenCertError, Result};
use crate::issuer::{Authority, Issuer};

/// Shape of the generated hierarchy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ChainShape {
    /// Root, one server leaf and one client certificate.
    #[default]
    Flat,
    /// Root, two intermediates, and one leaf per name.
    Tiered {
        servers: Vec<String>,
        clients: Vec<String>,
    },
}

/// Everything a generation run needs.
///
/// # Fields
/// * `hosts` - Hostnames and IP addresses for the flat shape's server and client certificates.
/// * `organization` - Organization written into every subject.
/// * `valid_for` - Lifetime of every certificate in the run.
/// * `shape` - Which hierarchy to build.
#[derive(Clone, Debug, Builder)]
pub struct ChainConfig {
    #[builder(default)]
    pub hosts: Vec<String>,
    pub organization: String,
    pub valid_for: Duration,
    #[builder(default)]
    pub shape: ChainShape,
}

/// One generated certificate and its key.
///
/// `name` is the stem the output writer uses for file names, e.g. `root` or `server1.local`.
#[derive(Clone, Debug)]
pub struct ChainEntry {
    pub name: String,
    pub role: Role,
    pub material: CertificateMaterial,
}

/// The complete output of one run, in issuance order (issuers before their subjects).
#[derive(Clone, Debug, Default)]
pub struct GeneratedChain {
    pub entries: Vec<ChainEntry>,
}

impl GeneratedChain {
    pub fn get(&self, name: &str) -> Option<&ChainEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn root(&self) -> Option<&ChainEntry> {
        self.entries.iter().find(|entry| entry.role == Role::Root)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(
        &mut self,
        name: &str,
        template: &CertificateTemplate,
        material: CertificateMaterial,
    ) -> Result<()> {
        if self.get(name).is_some() {
            return Err(GenCertError::InvalidInput(format!(
                "more than one certificate would be named {name:?}"
            )));
        }
        info!(
            entry = name,
            role = ?template.role,
            serial = %template.serial_number,
            fingerprint = %material.fingerprint(),
            "issued certificate"
        );
        self.entries.push(ChainEntry {
            name: name.to_string(),
            role: template.role,
            material,
        });
        Ok(())
    }
}

/// Generates the hierarchy described by `config`.
pub fn generate(config: &ChainConfig) -> Result<GeneratedChain> {
    if config.organization.trim().is_empty() {
        return Err(GenCertError::InvalidInput(
            "organization must not be empty".to_string(),
        ));
    }
    let validity = Validity::starting_now(config.valid_for)?;

    match &config.shape {
        ChainShape::Flat => generate_flat(config, validity),
        ChainShape::Tiered { servers, clients } => {
            if !config.hosts.is_empty() {
                warn!(
                    hosts = ?config.hosts,
                    "hosts are ignored by the tiered shape; each leaf is named after its server or client"
                );
            }
            generate_tiered(config, validity, servers, clients)
        }
    }
}

fn generate_flat(config: &ChainConfig, validity: Validity) -> Result<GeneratedChain> {
    let organization = config.organization.as_str();
    let mut chain = GeneratedChain::default();

    let (root_material, root) =
        Authority::new_root(CertificateTemplate::for_role(Role::Root, organization, validity)?)?;
    chain.push("root", &root.template, root_material)?;

    let leaf = CertificateTemplate::for_role(Role::Server, organization, validity)?
        .with_hosts(&config.hosts);
    chain.push("leaf", &leaf, root.issue(&leaf)?.material)?;

    let client = CertificateTemplate::for_role(Role::Client, organization, validity)?
        .with_hosts(&config.hosts);
    chain.push("client", &client, root.issue(&client)?.material)?;

    Ok(chain)
}

fn generate_tiered(
    config: &ChainConfig,
    validity: Validity,
    servers: &[String],
    clients: &[String],
) -> Result<GeneratedChain> {
    let organization = config.organization.as_str();
    let mut chain = GeneratedChain::default();

    let (root_material, root) =
        Authority::new_root(CertificateTemplate::for_role(Role::Root, organization, validity)?)?;
    chain.push("root", &root.template, root_material)?;

    let tiers = [
        ("intermediate-server", Role::ServerIntermediate, Role::Server, servers),
        ("intermediate-client", Role::ClientIntermediate, Role::Client, clients),
    ];
    for (intermediate_name, intermediate_role, leaf_role, names) in tiers {
        let (material, intermediate) = root.new_subordinate(CertificateTemplate::for_role(
            intermediate_role,
            organization,
            validity,
        )?)?;
        chain.push(intermediate_name, &intermediate.template, material)?;

        for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            let leaf = CertificateTemplate::for_role(leaf_role, organization, validity)?
                .with_common_name(name)
                .with_hosts(&[name]);
            chain.push(name, &leaf, intermediate.issue(&leaf)?.material)?;
        }
    }

    Ok(chain)
}
