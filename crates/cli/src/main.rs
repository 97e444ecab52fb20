use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use oasis_core::config::{default_config_path, load_config_from_path};
use oasis_core::{CallOptions, InMemoryProvider, OasisConfig, OasisRouter};
use oasis_types::{Holon, HolonKey, HolonType, LoadOptions, OasisResult, ProviderType};
use oasis_util::join_with_ampersand;
use serde::Serialize;
use serde_json::json;
use tracing::{Level, info};

/// Inspect and exercise the OASIS provider core.
#[derive(Parser, Debug)]
#[command(name = "oasis", version, about)]
struct Cli {
    /// Configuration file (defaults to $OASIS_CONFIG_PATH or the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every provider type and what this build can serve it with
    Providers,
    /// Validate and print the effective configuration
    Config {
        /// Print only the configuration file location
        #[arg(long)]
        path: bool,
    },
    /// Save and load a holon across in-memory providers, with failover
    Demo,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let Cli { config, command } = Cli::parse();
    let config_path = config.unwrap_or_else(default_config_path);

    match command {
        Command::Providers => list_providers(),
        Command::Config { path } => show_config(&config_path, path).await,
        Command::Demo => run_demo(&config_path).await,
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .try_init();
}

fn list_providers() -> Result<()> {
    let reference = Arc::new(InMemoryProvider::default()).handle().capabilities();
    for provider in ProviderType::ALL {
        let bundled = if *provider == ProviderType::InMemory {
            reference.to_string()
        } else {
            "adapter not bundled".to_string()
        };
        println!("{:<22} {:<11} {}", provider.as_str(), provider.category().to_string(), bundled);
    }
    Ok(())
}

async fn show_config(config_path: &Path, path_only: bool) -> Result<()> {
    if path_only {
        println!("{}", config_path.display());
        return Ok(());
    }

    let config = load_config_from_path(config_path)
        .with_context(|| format!("failed to load configuration from {}", config_path.display()))?;
    let router = OasisRouter::from_config(&config)?;
    let policy = router.policy().await;
    let settings = router.registry().settings();

    let out = json!({
        "path": config_path.display().to_string(),
        "config": config,
        "effective": {
            "autoFailover": policy.auto_failover,
            "autoReplication": policy.auto_replication,
            "failoverOrder": policy.failover_order,
            "replicationProviders": policy.replication_providers,
            "operationOrders": policy.class_orders.iter().map(|(class, order)| (format!("{class:?}"), order.clone())).collect::<std::collections::BTreeMap<_, _>>(),
            "callTimeoutMs": settings.call_timeout.as_millis() as u64,
            "activateTimeoutMs": settings.activate_timeout.as_millis() as u64,
            "deactivateTimeoutMs": settings.deactivate_timeout.as_millis() as u64,
        }
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

async fn run_demo(config_path: &Path) -> Result<()> {
    let config: OasisConfig = load_config_from_path(config_path)?;
    let router = OasisRouter::from_config(&config)?;

    let mut providers = router.policy().await.failover_order;
    if providers.is_empty() {
        providers = vec![ProviderType::MongoDb, ProviderType::Neo4j];
    }
    if providers.len() < 2 {
        bail!("the demo needs at least two providers in autoFailOverProviders");
    }
    for provider in &providers {
        router
            .registry()
            .register(Arc::new(InMemoryProvider::new(*provider)).handle())
            .await?;
    }
    let started = router.init().await;
    print_envelope("init", &started)?;
    info!(providers = %join_with_ampersand(providers.iter().map(|provider| provider.as_str())), "in-memory providers ready");

    let holon = Holon::new("Quest A", HolonType::Quest);
    let mirrors = providers[1..].to_vec();
    let saved = router.save_holon(&holon, &CallOptions::new().mirror_to(mirrors)).await;
    print_envelope("save_holon", &saved)?;

    let primary = providers[0];
    let stopped = router.deactivate(primary).await;
    print_envelope(&format!("deactivate {primary}"), &stopped)?;

    let loaded = router
        .load_holon(&HolonKey::Id(holon.id), &LoadOptions::default(), &CallOptions::new())
        .await;
    print_envelope("load_holon", &loaded)?;

    let shutdown = router.shutdown().await;
    print_envelope("shutdown", &shutdown)?;
    Ok(())
}

fn print_envelope<T: Serialize>(label: &str, result: &OasisResult<T>) -> Result<()> {
    let out = json!({
        "operation": label,
        "isError": result.is_error(),
        "message": result.message(),
        "warnings": result.warnings(),
        "provider": result.provider(),
        "value": result.value(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
