#![allow(dead_code)]

use gencert::cert::Certificate;
use gencert::chain::{ChainConfig, ChainShape, GeneratedChain, generate};

/// Generates the flat chain used by the end-to-end checks.
pub fn generate_flat(hosts: &[&str], organization: &str, hours: i64) -> GeneratedChain {
    let config = ChainConfig::builder()
        .hosts(hosts.iter().map(|h| h.to_string()).collect())
        .organization(organization.to_string())
        .valid_for(time::Duration::hours(hours))
        .build();
    generate(&config).expect("flat chain generation failed")
}

/// Generates a tiered chain with the given server and client names.
pub fn generate_tiered(servers: &[&str], clients: &[&str]) -> GeneratedChain {
    let config = ChainConfig::builder()
        .organization("ACME Company".to_string())
        .valid_for(time::Duration::hours(8760))
        .shape(ChainShape::Tiered {
            servers: servers.iter().map(|s| s.to_string()).collect(),
            clients: clients.iter().map(|c| c.to_string()).collect(),
        })
        .build();
    generate(&config).expect("tiered chain generation failed")
}

pub fn certificate(chain: &GeneratedChain, name: &str) -> Certificate {
    chain
        .get(name)
        .unwrap_or_else(|| panic!("no entry named {name}"))
        .material
        .certificate()
        .expect("generated certificate does not parse")
}
