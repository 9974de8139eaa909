use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use quill_core::errors::ExtensionError;
use quill_core::ids::ExtensionId;
use quill_store::LocalStore;
use quill_sync::{
    AppState, BootSequencer, Collaborators, Dispatcher, Extension, ExtensionLoader, HttpServerApi,
    TracingSurfaces,
};
use quill_telemetry::TelemetryConfig;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::sync::mpsc;
use tracing::Level;

#[derive(Debug, Parser)]
#[command(name = "quill", about = "Headless sync client")]
struct Args {
    /// Base URL of the server.
    #[arg(long, env = "QUILL_SERVER_URL", default_value = "http://127.0.0.1:6806")]
    server_url: String,

    /// Directory for local state. Defaults to ~/.quill.
    #[arg(long, env = "QUILL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: Level,

    /// Emit JSON log lines.
    #[arg(long)]
    log_json: bool,

    /// NDJSON message file to replay instead of stdin.
    #[arg(long)]
    messages: Option<PathBuf>,
}

/// The headless client has no extension host.
struct NoExtensions;

#[async_trait]
impl ExtensionLoader for NoExtensions {
    async fn enabled(&self) -> Result<Vec<ExtensionId>, ExtensionError> {
        Ok(Vec::new())
    }

    async fn load(&self, id: &ExtensionId) -> Result<Arc<dyn Extension>, ExtensionError> {
        Err(ExtensionError::NotFound(id.clone()))
    }

    async fn reload(&self, id: &ExtensionId) -> Result<Arc<dyn Extension>, ExtensionError> {
        Err(ExtensionError::NotFound(id.clone()))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    quill_telemetry::init_telemetry(&TelemetryConfig {
        log_level: args.log_level,
        module_levels: Vec::new(),
        json: args.log_json,
    })?;

    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(|| dirs_home().join(".quill"));
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;
    let db_path = data_dir.join("local.db");
    let store = LocalStore::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    tracing::info!(path = %db_path.display(), "local store opened");

    let surfaces = Arc::new(TracingSurfaces);
    let deps = Collaborators {
        api: Arc::new(HttpServerApi::new(&args.server_url)?),
        loader: Arc::new(NoExtensions),
        store: Arc::new(store),
        surfaces: surfaces.clone(),
    };
    let state = AppState::new();

    let report = BootSequencer::new(Arc::clone(&state), deps.clone(), surfaces)
        .run()
        .await
        .context("boot failed")?;
    tracing::info!(
        read_only = report.read_only,
        restored = report.restored_keys,
        signed_in = report.signed_in,
        server = %args.server_url,
        "client ready"
    );

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &args.messages {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let (tx, rx) = mpsc::channel(256);
    let reader_task = quill_sync::spawn_line_reader(reader, tx);
    let dispatcher = Dispatcher::new(state, deps);

    tokio::select! {
        handled = quill_sync::run_channel(&dispatcher, rx) => {
            tracing::info!(handled, "message stream ended");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }

    reader_task.abort();
    if let Some(sync) = report.sync_task {
        sync.abort();
    }
    Ok(())
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}
