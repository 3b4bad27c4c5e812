// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-provisioner
//!
//! Deterministic hosts, credentials and harnesses shared by the integration
//! tests. External processes are never spawned: every `vagrant`/`openstack`
//! call goes to a [`ScriptedRunner`] and the tenant is an
//! [`InMemoryNetworkApi`].
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use cim_provisioner::context::CREDENTIAL_VARS;
use cim_provisioner::document::empty_document;
use cim_provisioner::domain::{DeployArgs, HostDescriptor, Hostname, IdentityChain, MacAddress};
use cim_provisioner::network::InMemoryNetworkApi;
use cim_provisioner::provider::ScriptedRunner;
use cim_provisioner::{Context, Credentials, InMemoryHostCatalog, ReconciliationEngine, Settings};

pub const PRIMARY: &str = "infra-001";
pub const ALTERNATE: &str = "infra-002";
pub const USERNAME: &str = "alice";
pub const FLOATING_NETWORK: &str = "public-floating-601";

pub const STATUS_COMMAND: &str = "vagrant status --machine-readable";

pub fn hostname(name: &str) -> Hostname {
    Hostname::new(name).expect("Invalid hostname in test fixture")
}

pub fn chain() -> IdentityChain {
    IdentityChain::parse(PRIMARY, ALTERNATE).expect("Invalid identity chain in test fixture")
}

/// Host record as the catalog would return it
pub fn descriptor(name: &str, ip: &str) -> HostDescriptor {
    HostDescriptor {
        hostname: hostname(name),
        role: "infra".to_string(),
        domain: "example.com".to_string(),
        ip: ip.parse().expect("Invalid IP in test fixture"),
        mac: MacAddress::new("52:54:00:1a:2b:3c").expect("Invalid MAC in test fixture"),
        memory: 2048,
        box_name: Some("centos/7".to_string()),
        deploy_args: DeployArgs::default(),
        groups: vec!["infra".to_string()],
        profile: None,
        security_groups: vec![],
    }
}

/// Catalog knowing both members of the chain
pub fn catalog() -> InMemoryHostCatalog {
    InMemoryHostCatalog::new()
        .with_host(descriptor(PRIMARY, "10.0.20.11"))
        .with_host(descriptor(ALTERNATE, "10.0.20.12"))
}

pub fn credentials() -> Credentials {
    Credentials::from_lookup(|key| {
        CREDENTIAL_VARS
            .contains(&key)
            .then(|| format!("{}-value", key.to_ascii_lowercase()))
    })
    .expect("Incomplete credentials in test fixture")
}

pub fn settings() -> Settings {
    Settings {
        username: USERNAME.to_string(),
        propagation_delay_secs: 0,
        ..Settings::default()
    }
}

/// `vagrant status --machine-readable` output listing `machines`
pub fn status_output(machines: &[(&str, &str)]) -> String {
    machines
        .iter()
        .flat_map(|(name, state)| {
            [
                format!("1700000000,{},provider-name,virtualbox", name),
                format!("1700000000,{},state,{}", name, state),
            ]
        })
        .chain(std::iter::once("1700000000,,ui,info,Current machine states:".to_string()))
        .map(|line| line + "\n")
        .collect()
}

/// One engine wired to scripted collaborators in a scratch directory
pub struct Harness {
    pub dir: TempDir,
    pub runner: Arc<ScriptedRunner>,
    pub network: Arc<InMemoryNetworkApi>,
    pub engine: ReconciliationEngine,
}

pub struct HarnessBuilder {
    runner: ScriptedRunner,
    network: InMemoryNetworkApi,
    catalog: InMemoryHostCatalog,
    document: Option<String>,
    credentials: bool,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            runner: ScriptedRunner::new(),
            network: InMemoryNetworkApi::new().with_external_network(FLOATING_NETWORK),
            catalog: catalog(),
            document: None,
            credentials: false,
        }
    }

    /// Machines `vagrant status` reports
    pub fn status(mut self, machines: &[(&str, &str)]) -> Self {
        self.runner = self.runner.respond(STATUS_COMMAND, &status_output(machines));
        self
    }

    pub fn runner(mut self, f: impl FnOnce(ScriptedRunner) -> ScriptedRunner) -> Self {
        self.runner = f(self.runner);
        self
    }

    pub fn network(mut self, network: InMemoryNetworkApi) -> Self {
        self.network = network;
        self
    }

    pub fn catalog(mut self, catalog: InMemoryHostCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Start with an empty, initialized Vagrantfile
    pub fn with_document(self) -> Self {
        self.with_document_text(&empty_document())
    }

    pub fn with_document_text(mut self, text: &str) -> Self {
        self.document = Some(text.to_string());
        self
    }

    pub fn with_credentials(mut self) -> Self {
        self.credentials = true;
        self
    }

    pub fn build(self) -> Harness {
        let dir = tempfile::tempdir().expect("Cannot create scratch directory");
        let mut ctx = Context::new(dir.path(), settings());
        if self.credentials {
            ctx = ctx.with_credentials(credentials());
        }
        if let Some(text) = &self.document {
            std::fs::write(ctx.document_path(), text).expect("Cannot write Vagrantfile");
        }

        let runner = Arc::new(self.runner);
        let network = Arc::new(self.network);
        let engine = ReconciliationEngine::new(
            ctx,
            runner.clone(),
            Arc::new(self.catalog),
            network.clone(),
        );
        Harness {
            dir,
            runner,
            network,
            engine,
        }
    }
}

impl Harness {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn document_path(&self) -> PathBuf {
        self.engine.context().document_path()
    }

    pub fn document(&self) -> String {
        std::fs::read_to_string(self.document_path()).expect("Vagrantfile missing")
    }

    /// Commands that are not status queries
    pub fn actions(&self) -> Vec<String> {
        self.runner
            .executed_commands()
            .into_iter()
            .filter(|command| command != STATUS_COMMAND)
            .collect()
    }
}
