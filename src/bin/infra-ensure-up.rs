// Copyright (c) 2025 - Cowboy AI, Inc.
//! infra-ensure-up
//!
//! Makes one member of a singleton node pair run at the requested location.
//! Prints the identity it ended up using on stdout and exits 0, or prints the
//! error on stderr and exits 1.
//!
//! Run with: cargo run --bin infra-ensure-up -- --location remote --workdir ./site
//!
//! Remote runs need the tenant credentials in the environment:
//! `OS_USERNAME`, `OS_PASSWORD`, `OS_AUTH_URL`, `OS_TENANT_NAME`,
//! `OS_TENANT_ID`, `OS_REGION_NAME`.

use anyhow::{Context as _, Result};
use clap::Parser;
use cim_provisioner::{
    document::ConfigEmitter,
    domain::{IdentityChain, Location},
    network::OpenStackCli,
    provider::ProcessRunner,
    Context, Credentials, Outcome, ReconciliationEngine, Settings, YamlHostCatalog,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "infra-ensure-up",
    version,
    about = "Ensure a singleton infrastructure node is up"
)]
struct Cli {
    /// Where the node should run (local or remote)
    #[arg(long, env = "INFRA_LOCATION", default_value = "local")]
    location: Location,

    /// Preferred identity
    #[arg(long, env = "INFRA_PRIMARY", default_value = "infra-001")]
    primary: String,

    /// Fail-over identity used when the primary exists elsewhere
    #[arg(long, env = "INFRA_ALTERNATE", default_value = "infra-002")]
    alternate: String,

    /// Directory holding the Vagrantfile and resource cache
    #[arg(long, env = "INFRA_WORKDIR", default_value = ".")]
    workdir: PathBuf,

    /// Owner prefix for tenant resource names (defaults to OS_USERNAME)
    #[arg(long)]
    username: Option<String>,

    /// Root of the host inventory
    #[arg(long)]
    inventory: Option<PathBuf>,

    /// Replace the Vagrantfile with an empty one before reconciling
    #[arg(long)]
    reinit: bool,
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::from_env().context("invalid INFRA_* settings")?;
        if let Some(username) = &self.username {
            settings.username = username.clone();
        }
        if let Some(inventory) = &self.inventory {
            settings.inventory_root = inventory.clone();
        }
        settings.validate().context("invalid settings")?;
        Ok(settings)
    }
}

async fn run(cli: Cli) -> Result<Outcome> {
    let chain = IdentityChain::parse(&cli.primary, &cli.alternate)
        .context("invalid identity chain")?;
    let settings = cli.settings()?;

    let mut ctx = Context::new(&cli.workdir, settings);
    match Credentials::from_env() {
        Ok(credentials) => ctx = ctx.with_credentials(credentials),
        Err(e) if cli.location == Location::Remote => {
            return Err(e).context("remote location needs tenant credentials");
        }
        Err(_) => info!("No tenant credentials in the environment; local only"),
    }

    if cli.reinit {
        warn!("Reinitializing {}", ctx.document_path().display());
        ConfigEmitter::from_settings(&ctx.settings)
            .init_document(&ctx.document_path(), true)
            .await
            .context("cannot reinitialize the provisioning document")?;
    }

    let runner = Arc::new(ProcessRunner);
    let catalog = Arc::new(YamlHostCatalog::new(ctx.settings.hosts_dir()));
    let network = Arc::new(OpenStackCli::new(runner.clone()));
    let engine = ReconciliationEngine::new(ctx, runner, catalog, network);

    Ok(engine.infra_ensure_up(cli.location, &chain).await)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(outcome) if outcome.is_success() => {
            println!("{}", outcome.message());
            ExitCode::SUCCESS
        }
        Ok(outcome) => {
            eprintln!("{}", outcome.message());
            ExitCode::from(outcome.exit_code() as u8)
        }
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
