// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Document Shape

use cim_provisioner::context::Settings;
use cim_provisioner::document::{
    empty_document, render_block, BlockDefaults, ProviderInfo, ProvisioningDocument, VmBlock,
};
use cim_provisioner::domain::{DeployArgs, HostDescriptor, Hostname, MacAddress};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn host(name: &str, octet: u8) -> HostDescriptor {
    HostDescriptor {
        hostname: Hostname::new(name).unwrap(),
        role: "infra".to_string(),
        domain: "example.com".to_string(),
        ip: format!("10.0.20.{}", octet).parse().unwrap(),
        mac: MacAddress::new(format!("52:54:00:00:00:{:02x}", octet)).unwrap(),
        memory: 1024,
        box_name: Some("centos/7".to_string()),
        deploy_args: DeployArgs::default(),
        groups: vec![],
        profile: None,
        security_groups: vec![],
    }
}

proptest! {
    /// Appending distinct hosts keeps one block each and exactly one trailer
    #[test]
    fn prop_appends_keep_document_well_formed(
        names in prop::collection::btree_set("[a-z]{1,8}-[0-9]{3}", 1..6),
    ) {
        let defaults = BlockDefaults::from_settings(&Settings::default());
        let mut text = empty_document();
        let names: Vec<String> = names.into_iter().collect();

        for (i, name) in names.iter().enumerate() {
            let block = VmBlock::build(&host(name, i as u8 + 10), ProviderInfo::Local, &defaults);
            prop_assert!(block.validate().is_ok());
            text = ProvisioningDocument::parse(&text).unwrap().with_block(&render_block(&block));
        }

        let document = ProvisioningDocument::parse(&text).unwrap();
        let found: BTreeSet<String> = document.hostnames().iter().map(|h| h.to_string()).collect();
        prop_assert_eq!(found.len(), names.len());
        prop_assert_eq!(found, names.iter().cloned().collect::<BTreeSet<_>>());
        prop_assert!(text.ends_with("  end\nend\n"));
    }
}
