use anyhow::Context;
use chrono::Utc;
use retention_engine::metrics::init_metrics;
use retention_engine::notify::TracingAlertSink;
use retention_engine::{EngineConfig, FileDescriptor, RetentionEngine};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_STATE_DIR: &str = ".retention";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(files_path) = args.next().map(PathBuf::from) else {
        eprintln!("usage: retention-watch <files.json> [state-dir]");
        std::process::exit(2);
    };
    let state_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR));

    init_metrics();

    let config = EngineConfig::from_env().context("loading configuration")?;
    let engine = RetentionEngine::open(config, &state_dir)
        .with_context(|| format!("opening state in {}", state_dir.display()))?;

    let raw = std::fs::read_to_string(&files_path)
        .with_context(|| format!("reading {}", files_path.display()))?;
    let files: Vec<FileDescriptor> =
        serde_json::from_str(&raw).context("parsing file list")?;

    let evaluation = engine.check_expirations(&files, Utc::now(), &TracingAlertSink);

    println!("Files: {}", files.len());
    if evaluation.notifications.is_empty() {
        println!("No files close to expiry.");
    }
    for n in &evaluation.notifications {
        println!("  [{:>8}] {} ({})", n.status, n.file_name, n.time_remaining);
    }
    for id in &evaluation.skipped {
        println!("  [skipped] {id}: unreadable creation time");
    }

    let quota = engine.quota();
    println!();
    println!("Storage: {} ({}%)", quota.format_usage(), quota.percentage());
    println!("         {}", quota.format_remaining());
    if let Some(warning) = quota.storage_warning() {
        println!("         {warning}");
    }

    println!();
    println!("Retention: {}", engine.policy().retention_description());
    println!("Tour: {:?}", engine.tutorial_state());

    if engine.is_degraded() {
        tracing::warn!("State could not be persisted; changes from this run are lost");
    }

    Ok(())
}
