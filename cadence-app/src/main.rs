use anyhow::Result;
use cadence_common::CadenceError;
use cadence_common::observability::{LogConfig, init_logging};
use cadence_config::{CadenceConfig, CadenceConfigLoader};
use cadence_engine::CancellationSignal;
use cadence_runtime::{CadenceRuntime, RuntimeOptions};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use wiring::build_session;
mod wiring;

#[derive(Parser, Debug)]
#[command(name = "cadence", version, about = "Paced item-processing state machine (dry run)")]
struct Cli {
    /// YAML configuration; missing files fall back to defaults.
    #[arg(long, env = "CADENCE_CONFIG", default_value = "cadence.yaml")]
    config: PathBuf,
    /// Seed for a reproducible session.
    #[arg(long)]
    seed: Option<u64>,
    /// Stop after this many items.
    #[arg(long)]
    max_items: Option<u64>,
    /// Mirror logs to stderr.
    #[arg(long)]
    stderr: bool,
}

fn load_config(cli: &Cli) -> Result<CadenceConfig, CadenceError> {
    let mut cfg = CadenceConfigLoader::new()
        .with_optional_file(&cli.config)
        .load()
        .map_err(|e| CadenceError::Config(format!("{}: {e}", cli.config.display())))?;

    if cli.seed.is_some() {
        cfg.session.seed = cli.seed;
    }
    if cli.max_items.is_some() {
        cfg.session.max_items = cli.max_items;
    }
    if cli.stderr {
        cfg.logging.emit_stderr = true;
    }
    Ok(cfg)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = load_config(&cli)?;

    let log_path = init_logging(LogConfig {
        app_name: "cadence",
        log_dir: cfg.logging.dir.as_ref().map(PathBuf::from),
        emit_stderr: cfg.logging.emit_stderr,
        format: cfg.logging.format,
        default_filter: cfg.logging.filter.clone(),
    })
    .map_err(|e| CadenceError::Logging(format!("{e:#}")))?;
    tracing::info!(target: "cadence.app", log = %log_path.display(), "logging initialised");

    let runtime = CadenceRuntime::build(RuntimeOptions {
        worker_threads: Some(2),
        shutdown_grace: Duration::from_secs(2),
        ..RuntimeOptions::default()
    })?;
    let signal = runtime.session_signal();

    let outcome = runtime.run(async {
        let mut session = build_session(&cfg, signal)?;
        session.run().await?;
        tracing::info!(
            target: "cadence.app",
            completed = session.automation().completed(),
            final_state = ?session.machine().current_state(),
            cancelled = session.signal().is_cancelled(),
            "exiting"
        );
        Ok::<(), CadenceError>(())
    });

    outcome.map_err(anyhow::Error::from)
}
