//! # embedgate-api
//!
//! Embedding service binary: wires settings, secrets, the model lifecycle,
//! and the HTTP server together.

mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use embedgate_model::{MockBackend, ModelBackend, ResourceManager};
use embedgate_secrets::{
    EncryptionGateway, EnvSecretStore, GatewayConfig, SecretStore, resolve_encryption_status,
};
use embedgate_server::{AppState, ServerConfig, ShutdownCoordinator};
use embedgate_settings::{
    BackendKind, Settings, config_dir, config_path, environment, load_settings_from_path,
};

/// Embedding service server.
#[derive(Parser, Debug)]
#[command(name = "embedgate", about = "Instruction-tuned embedding service")]
struct Cli {
    /// Directory holding `config/{environment}.json` profiles
    /// (overrides `EMBEDGATE_CONFIG_DIR`).
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Port to bind (overrides settings if specified).
    #[arg(long)]
    port: Option<u16>,

    /// Deployment environment profile (overrides `ENVIRONMENT`).
    #[arg(long)]
    environment: Option<String>,

    /// Emit JSON log lines regardless of settings.
    #[arg(long)]
    log_json: bool,
}

/// Deployment environment: `--environment` flag, then `ENVIRONMENT`, then `prd`.
fn environment_name(args: &Cli) -> String {
    args.environment.clone().unwrap_or_else(environment)
}

/// Load settings for the selected profile and apply flag overrides.
fn resolve_settings(args: &Cli) -> Result<Settings> {
    let env = environment_name(args);
    let base = args.config_dir.clone().unwrap_or_else(config_dir);
    let mut settings = load_settings_from_path(&config_path(&base, &env))
        .with_context(|| format!("Failed to load settings for environment '{env}'"))?;

    if let Some(port) = args.port {
        settings.server.port = port;
    }
    if args.log_json {
        settings.logging.json = true;
    }
    Ok(settings)
}

/// Construct the embedding backend selected by settings.
fn build_backend(settings: &Settings) -> Result<Arc<dyn ModelBackend>> {
    match settings.model.backend {
        BackendKind::Mock => Ok(Arc::new(MockBackend::default())),
        #[cfg(feature = "ort")]
        BackendKind::Onnx => Ok(Arc::new(embedgate_model::OnnxBackend::new(
            embedgate_model::OnnxConfig::default(),
        ))),
        #[cfg(not(feature = "ort"))]
        BackendKind::Onnx => anyhow::bail!(
            "settings select the onnx backend but this binary was built without the `ort` feature"
        ),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Settings before logging so the subscriber picks up the configured level.
    let settings = resolve_settings(&args)?;
    telemetry::init(&settings.logging);

    let env_name = environment_name(&args);
    tracing::info!(
        environment = %env_name,
        model = %settings.model.name,
        backend = ?settings.model.backend,
        "starting embedgate"
    );

    // Secret store + encryption gateway. A configured status secret overrides
    // the static `enabled` flag at startup.
    let store: Arc<dyn SecretStore> = Arc::new(EnvSecretStore::new());
    let encryption = &settings.encryption;
    let enabled = if let Some(secret_id) = &encryption.status_secret {
        resolve_encryption_status(
            store.as_ref(),
            secret_id,
            &encryption.secret_version,
            encryption.region.as_deref(),
        )
    } else {
        encryption.enabled
    };
    let gateway = Arc::new(EncryptionGateway::new(
        GatewayConfig {
            enabled,
            secret_version: encryption.secret_version.clone(),
            region: encryption.region.clone(),
        },
        store,
    ));
    tracing::info!(enabled, key_name = %encryption.key_name, "encryption gateway ready");

    // Model load is fatal when it fails: without a model there is nothing
    // to serve.
    let backend = build_backend(&settings)?;
    let manager = ResourceManager::initialize(settings.model.name.clone(), backend)
        .await
        .context("Failed to load embedding model")?;

    let metrics = embedgate_server::metrics::install_recorder();
    let config = ServerConfig {
        host: settings.server.host.clone(),
        port: settings.server.port,
        request_timeout_secs: settings.server.request_timeout_secs,
    };
    let state = AppState::new(
        Arc::clone(&manager),
        gateway,
        encryption.key_name.clone(),
        Duration::from_secs(config.request_timeout_secs),
        metrics,
    );

    let mut coordinator = ShutdownCoordinator::new();

    if settings.model.reload.enabled {
        let interval = Duration::from_secs(settings.model.reload.interval_secs);
        let token = coordinator.token();
        coordinator.register(manager.spawn_scheduled_reload(interval, token));
    }

    let handle = embedgate_server::start(config, state, coordinator.token())
        .await
        .context("Failed to bind server")?;
    tracing::info!(
        "embedgate listening on http://{}:{} (environment {env_name})",
        settings.server.host,
        handle.port
    );
    coordinator.register(handle.task);

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    coordinator.graceful_shutdown(None).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
