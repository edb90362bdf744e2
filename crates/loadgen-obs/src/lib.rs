//! Process-wide logging: timestamped, leveled lines to stdout and to an
//! append-only log file.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use loadgen_common::{LoadgenError, Result};

/// Installs the global subscriber. Call once at process start; a second
/// call fails with [`LoadgenError::Logging`].
pub fn init_logging(log_file: &Path) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file = OpenOptions::new().create(true).append(true).open(log_file)?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stdout))
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .try_init()
        .map_err(|e| LoadgenError::Logging(e.to_string()))?;

    tracing::info!(target: "obs", path = %log_file.display(), "logging initialized");
    Ok(())
}
