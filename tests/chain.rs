mod util;

use std::collections::HashSet;
use std::net::IpAddr;

use gencert::cert::extensions::{ExtendedKeyUsageOption, KeyUsage, KeyUsages};
use gencert::cert::Certificate;
use gencert::cert::params::Role;
use gencert::key::KeyPair;

/// Generates the default fixture and checks the three certificates against each other.
#[test]
fn flat_chain_end_to_end() {
    let chain = util::generate_flat(&["localhost", "127.0.0.1"], "Acme Co", 8760);
    assert_eq!(chain.len(), 3);

    let root = util::certificate(&chain, "root");
    let leaf = util::certificate(&chain, "leaf");
    let client = util::certificate(&chain, "client");

    assert!(root.is_self_issued());
    assert!(root.is_ca().unwrap());
    assert!(!leaf.is_ca().unwrap());
    assert!(!client.is_ca().unwrap());

    assert_eq!(
        root.extended_key_usage().unwrap().usage,
        vec![
            ExtendedKeyUsageOption::ServerAuth,
            ExtendedKeyUsageOption::ClientAuth
        ]
    );
    assert_eq!(
        leaf.extended_key_usage().unwrap().usage,
        vec![ExtendedKeyUsageOption::ServerAuth]
    );
    assert_eq!(
        client.extended_key_usage().unwrap().usage,
        vec![ExtendedKeyUsageOption::ClientAuth]
    );

    assert_eq!(
        root.extension::<KeyUsage>().unwrap(),
        Some(KeyUsage(KeyUsages::DigitalSignature | KeyUsages::KeyCertSign))
    );
    assert_eq!(
        leaf.extension::<KeyUsage>().unwrap(),
        Some(KeyUsage(KeyUsages::DigitalSignature.into()))
    );

    for cert in [&root, &leaf, &client] {
        assert_eq!(cert.subject().organization.as_deref(), Some("Acme Co"));
        assert_eq!(
            cert.subject().serial_number,
            Some(cert.serial_number().unwrap().to_string())
        );
    }
}

#[test]
fn subordinates_verify_against_root_only() {
    let chain = util::generate_flat(&["localhost"], "Acme Co", 24);
    let root = util::certificate(&chain, "root");
    let root_key = root.public_key().unwrap();
    root.verify_signed_by(&root_key).unwrap();

    let unrelated = KeyPair::generate().unwrap().public_key();
    for name in ["leaf", "client"] {
        let cert = util::certificate(&chain, name);
        assert_eq!(cert.issuer(), root.subject());
        assert!(!cert.is_self_issued());
        cert.verify_signed_by(&root_key).unwrap();
        assert!(cert.verify_signed_by(&unrelated).is_err());
        assert!(
            cert.verify_signed_by(&cert.public_key().unwrap())
                .is_err()
        );
    }
}

#[test]
fn hosts_are_split_into_ip_and_dns_sets() {
    let chain = util::generate_flat(&["10.0.0.5", "server1.local"], "Acme Co", 24);

    let root = util::certificate(&chain, "root");
    assert!(root.subject_alt_names().unwrap().is_empty());

    for name in ["leaf", "client"] {
        let san = util::certificate(&chain, name).subject_alt_names().unwrap();
        assert_eq!(san.ip_addresses, vec!["10.0.0.5".parse::<IpAddr>().unwrap()]);
        assert_eq!(san.dns_names, vec!["server1.local".to_string()]);
    }
}

#[test]
fn serial_numbers_are_pairwise_distinct() {
    let chain = util::generate_tiered(
        &["server1.local", "server2.local", "server3.local"],
        &["client1", "client2", "client3"],
    );
    let serials: HashSet<u128> = chain
        .iter()
        .map(|entry| {
            entry
                .material
                .certificate()
                .unwrap()
                .serial_number()
                .unwrap()
        })
        .collect();
    assert_eq!(serials.len(), chain.len());
    assert_eq!(chain.len(), 9);
}

#[test]
fn validity_window_matches_requested_duration() {
    let chain = util::generate_flat(&["localhost"], "Acme Co", 8760);
    let windows: Vec<_> = chain
        .iter()
        .map(|entry| entry.material.certificate().unwrap().validity().unwrap())
        .collect();

    for window in &windows {
        assert_eq!(window.duration(), time::Duration::days(365));
        assert_eq!(*window, windows[0]);
    }
}

#[test]
fn pem_blocks_round_trip_to_der() {
    let chain = util::generate_flat(&["localhost"], "Acme Co", 24);
    for entry in chain.iter() {
        let material = &entry.material;

        let cert = pem::parse(material.certificate_pem()).unwrap();
        assert_eq!(cert.tag(), "CERTIFICATE");
        assert_eq!(cert.contents(), material.certificate_der());

        let key = pem::parse(material.private_key_pem()).unwrap();
        assert_eq!(key.tag(), "PRIVATE KEY");
        assert_eq!(key.contents(), material.private_key_der());

        let key_pair = material.private_key().unwrap();
        assert_eq!(
            key_pair.public_key(),
            material.certificate().unwrap().public_key().unwrap()
        );
    }
}

#[test]
fn certificate_pem_parses_and_re_encodes() {
    let chain = util::generate_tiered(&["server1.local"], &["client1"]);
    for entry in chain.iter() {
        let material = &entry.material;
        let from_pem = Certificate::from_pem(material.certificate_pem()).unwrap();
        assert_eq!(from_pem, material.certificate().unwrap());
        assert_eq!(from_pem.to_pem().unwrap(), material.certificate_pem());
        assert_eq!(from_pem.fingerprint().unwrap(), material.fingerprint());

        let (_, parsed) = x509_parser::parse_x509_certificate(material.certificate_der()).unwrap();
        let parsed_ski = parsed
            .extensions()
            .iter()
            .find_map(|ext| match ext.parsed_extension() {
                x509_parser::extensions::ParsedExtension::SubjectKeyIdentifier(kid) => {
                    Some(kid.0.to_vec())
                }
                _ => None,
            });
        let ski = from_pem.subject_key_identifier().unwrap();
        assert!(ski.is_some());
        assert_eq!(ski, parsed_ski);
        assert_eq!(
            ski,
            Some(from_pem.public_key().unwrap().key_identifier().unwrap())
        );
    }

    assert!(Certificate::from_pem(chain.root().unwrap().material.private_key_pem()).is_err());
}

#[test]
fn tiered_chain_is_signed_level_by_level() {
    let chain = util::generate_tiered(&["server1.local", "10.1.2.3"], &["client1"]);
    let names: Vec<_> = chain.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "root",
            "intermediate-server",
            "server1.local",
            "10.1.2.3",
            "intermediate-client",
            "client1"
        ]
    );

    let root = util::certificate(&chain, "root");
    let server_ca = util::certificate(&chain, "intermediate-server");
    let client_ca = util::certificate(&chain, "intermediate-client");
    let root_key = root.public_key().unwrap();

    for ca in [&server_ca, &client_ca] {
        assert!(ca.is_ca().unwrap());
        ca.verify_signed_by(&root_key).unwrap();
        assert_eq!(ca.issuer(), root.subject());
    }

    let server = util::certificate(&chain, "server1.local");
    server
        .verify_signed_by(&server_ca.public_key().unwrap())
        .unwrap();
    assert!(server.verify_signed_by(&root_key).is_err());
    assert!(
        server
            .verify_signed_by(&client_ca.public_key().unwrap())
            .is_err()
    );
    assert_eq!(server.subject().common_name.as_deref(), Some("server1.local"));
    assert_eq!(
        server.subject_alt_names().unwrap().dns_names,
        vec!["server1.local".to_string()]
    );
    assert_eq!(
        server.extended_key_usage().unwrap().usage,
        vec![ExtendedKeyUsageOption::ServerAuth]
    );

    let by_ip = util::certificate(&chain, "10.1.2.3");
    let san = by_ip.subject_alt_names().unwrap();
    assert!(san.dns_names.is_empty());
    assert_eq!(san.ip_addresses, vec!["10.1.2.3".parse::<IpAddr>().unwrap()]);

    let client = util::certificate(&chain, "client1");
    client
        .verify_signed_by(&client_ca.public_key().unwrap())
        .unwrap();
    assert_eq!(
        client.extended_key_usage().unwrap().usage,
        vec![ExtendedKeyUsageOption::ClientAuth]
    );

    let roles: Vec<Role> = chain.iter().map(|e| e.role).collect();
    assert_eq!(roles.iter().filter(|r| r.is_ca()).count(), 3);
}
