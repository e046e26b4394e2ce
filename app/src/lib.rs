//! Opyn client application library
//!
//! Loads configuration, initializes logging, wires the chain, relay and
//! subgraph clients into a session and serves it over HTTP.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use eth_client::{EthClient, WalletSubmitter};
use opyn_api::AppState;
use opyn_core::{AppConfig, LoggingConfig, TxNotifier, TxSubmitter};
use opyn_session::{Session, Sources};
use relay_client::{GraphClient, RelayClient};
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "OPYN_CONFIG";

/// Environment variable holding the signing key when the config has none
pub const PRIVATE_KEY_ENV: &str = "OPYN_PRIVATE_KEY";

/// Initialize the tracing subscriber. `RUST_LOG` overrides the configured level.
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            fmt().json().with_env_filter(filter).init();
        }
        _ => {
            fmt().with_env_filter(filter).init();
        }
    }
}

/// Config path from `--config <path>` / `--config=<path>`, else `fallback`
pub fn config_path(
    args: impl IntoIterator<Item = String>,
    fallback: Option<String>,
) -> Option<PathBuf> {
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                return Some(PathBuf::from(path));
            }
        } else if let Some(path) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(path));
        }
    }
    fallback.filter(|p| !p.is_empty()).map(PathBuf::from)
}

/// Load the config file, or defaults when no path is given, then fill the
/// signing key from `env_key` if the file has none.
pub fn load_config(path: Option<&Path>, env_key: Option<String>) -> anyhow::Result<AppConfig> {
    let mut config = match path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AppConfig::default(),
    };

    if config.wallet.private_key.is_none() {
        config.wallet.private_key = env_key.filter(|k| !k.trim().is_empty());
    }

    Ok(config)
}

/// Build the chain, relay and subgraph clients and the optional signer
pub fn build_sources(config: &AppConfig) -> anyhow::Result<Sources> {
    let notifier = TxNotifier::default();
    let chain = EthClient::new(config.node.clone()).context("creating node client")?;
    let relay = RelayClient::new(config.relay.clone()).context("creating relay client")?;
    let graph = GraphClient::new(config.graph.clone()).context("creating subgraph client")?;

    let submitter: Option<Arc<dyn TxSubmitter>> = match &config.wallet.private_key {
        Some(key) => Some(Arc::new(
            WalletSubmitter::new(
                &config.node,
                key,
                config.contracts.options_factory,
                notifier.clone(),
            )
            .context("creating wallet")?,
        )),
        None => {
            tracing::warn!("No signing key configured, running read-only");
            None
        }
    };

    Ok(Sources {
        chain: Arc::new(chain),
        relay: Arc::new(relay),
        graph: Arc::new(graph),
        submitter,
        notifier,
    })
}

/// Warn when the node serves a different chain than configured
async fn check_network(config: &AppConfig) {
    let Ok(client) = EthClient::new(config.node.clone()) else {
        return;
    };
    match client.chain_id().await {
        Ok(chain_id) if chain_id != config.network.chain_id() => {
            tracing::warn!(
                chain_id,
                expected = config.network.chain_id(),
                network = config.network.as_str(),
                "Node serves a different chain than configured"
            );
        }
        Ok(chain_id) => tracing::info!(chain_id, "Connected to node"),
        Err(e) => tracing::warn!(error = %e, url = %config.node.rpc_url, "Node not reachable yet"),
    }
}

/// Run the session and the API server until ctrl-c
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!(
        network = config.network.as_str(),
        markets = config.markets.len(),
        port = config.api_port,
        "Starting Opyn client"
    );

    let sources = build_sources(&config)?;
    check_network(&config).await;

    let session = Session::new(sources, &config);
    session.start();

    let port = config.api_port;
    let state = AppState::new(config, session);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        tracing::info!("Shutdown signal received");
    };

    let served = opyn_api::start_server(state.clone(), port, shutdown).await;
    state.shutdown();
    served.context("API server failed")
}
