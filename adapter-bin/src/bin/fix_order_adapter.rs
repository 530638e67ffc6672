//! FIX 4.4 order adapter: reads `OrderRequest`s off a TCP ingress socket,
//! runs them through validation, instrument resolution and pre-trade risk,
//! and ships the survivors to a broker over a FIX 4.4 session.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use adapter_core::prelude::*;
use adapter_core::fix::FileSequenceStore;
use anyhow::Context;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "fix-order-adapter", about = "FIX 4.4 order adapter")]
struct Cli {
    /// Path to a JSON config file. Falls back to built-in defaults when absent.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for FIX sequence-number and outbound-journal persistence.
    #[arg(long, default_value = "./fix-store")]
    store_dir: PathBuf,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AdapterConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
        }
        None => Ok(AdapterConfig::default()),
    }
}

fn install_shutdown_handler() -> Arc<AtomicBool> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    ctrlc::set_handler(move || {
        tracing::info!("shutdown signal received");
        flag.store(true, Ordering::SeqCst);
    })
    .expect("failed to install signal handler");
    shutdown
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    adapter_core::utils::init_logger(&config.observability.log_level, config.observability.json_logs);

    tracing::info!("=== FIX 4.4 order adapter ===");
    tracing::info!(sender_comp_id = %config.fix.sender_comp_id, target_comp_id = %config.fix.target_comp_id, "starting session");

    let shutdown = install_shutdown_handler();

    let store: Arc<dyn adapter_core::fix::SequenceStore> = Arc::new(
        FileSequenceStore::new(&cli.store_dir)
            .with_context(|| format!("opening FIX sequence store at {}", cli.store_dir.display()))?,
    );
    let mut session = Session::new(config.fix.clone(), store);
    // Writing the Logon bytes to the broker socket and feeding inbound bytes
    // back through `fix::decode::parse` is the transport's job; that wiring
    // is an external collaborator from this core's point of view.
    match session.connect(chrono::Utc::now())? {
        SessionAction::Send(bytes) => tracing::info!(len = bytes.len(), "logon ready to send to broker transport"),
        other => tracing::warn!(?other, "unexpected action from session.connect"),
    }

    let processor = OrderProcessor::new(config.ingress.option_symbols.iter().cloned(), config.risk.clone());
    let risk_engine = processor.risk_engine();
    let mut gateway = Gateway::new(&mut session, risk_engine);
    let listener = IngressListener::new(&config.ingress);

    let run_ingress = listener.run(move |request| -> Result<(), PipelineError> {
        let processed = processor.process(&request)?;
        gateway.send_order(processed)?;
        Ok(())
    });

    tokio::select! {
        result = run_ingress => {
            if let Err(e) = result {
                tracing::error!(error = %e, "ingress listener exited");
            }
        }
        _ = poll_shutdown(shutdown) => {
            tracing::info!("shutting down");
        }
    }

    Ok(())
}

async fn poll_shutdown(flag: Arc<AtomicBool>) {
    loop {
        if flag.load(Ordering::SeqCst) {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    }
}
