use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::paths::LOG_FILE;

/// Initialize tracing into `{log_dir}/aider-start.log`.
///
/// The TUI owns stdout, so nothing is written to the terminal. The filter
/// comes from `level` when given, then `RUST_LOG`, then `info`.
pub fn init(log_dir: &Path, level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    if let Err(e) = std::fs::create_dir_all(log_dir) {
        eprintln!("Logging disabled: cannot create {}: {e}", log_dir.display());
        return;
    }

    let file_layer = fmt::layer()
        .with_writer(tracing_appender::rolling::never(log_dir, LOG_FILE))
        .with_ansi(false)
        .with_target(true);

    // A second init (tests, repeated CLI calls) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init();

    tracing::debug!(dir = %log_dir.display(), "Tracing initialized");
}
