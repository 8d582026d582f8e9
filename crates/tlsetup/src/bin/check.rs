//! tlsetup-check - validate TLS settings and build the rustls configuration.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum, ValueHint};
use tlsetup::{EndpointConfig, SettingsLoader};
use tlsetup_common_log::LogConfig;
use tracing::{error, info};

/// Check that TLS settings load into a usable endpoint configuration.
#[derive(Debug, Parser)]
#[command(name = "tlsetup-check", version, about, long_about = None)]
struct Args {
    /// Path to settings file
    #[arg(short, long, env = "TLSETUP_CONFIG", value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Which side of the connection to assemble
    #[arg(short, long, value_enum, default_value_t = Role::Server)]
    role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Role {
    Server,
    Client,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    if let Err(e) = tlsetup_common_log::init(LogConfig::from_env()) {
        eprintln!("failed to initialise logging: {e}");
        return ExitCode::from(2);
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let mut loader = SettingsLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_config_path(path);
    }
    let settings = loader.load()?;

    if let Err(problems) = settings.validate() {
        for problem in &problems {
            error!(%problem, "Invalid settings");
        }
        return Err(anyhow!("{} problem(s) in settings", problems.len()));
    }

    let endpoint = EndpointConfig::from_settings(&settings).context("Failed to build endpoint configuration")?;

    let alpn = settings.alpn_protocols.join(",");
    match args.role {
        Role::Server => {
            endpoint.server_config().context("Failed to assemble server configuration")?;
        }
        Role::Client => {
            endpoint.client_config().context("Failed to assemble client configuration")?;
        }
    }

    info!(
        role = ?args.role,
        trust_pool = endpoint.trust_pool.len(),
        identities = endpoint.identities.len(),
        chain_len = endpoint.primary_identity().map_or(0, |id| id.chain().len()),
        min_version = endpoint.versions.min.map(|v| v.name()).unwrap_or("unset"),
        max_version = endpoint.versions.max.map(|v| v.name()).unwrap_or("unset"),
        client_auth = ?endpoint.client_auth,
        alpn = %alpn,
        "TLS configuration OK"
    );
    Ok(())
}
