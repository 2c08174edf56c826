use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDateTime;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// `eft_debug_<YYYYmmdd_HHMMSS>.log`
pub fn log_file_name(at: NaiveDateTime) -> String {
    format!("eft_debug_{}.log", at.format("%Y%m%d_%H%M%S"))
}

fn open_log_file(dir: &Path) -> std::io::Result<(PathBuf, File)> {
    fs::create_dir_all(dir)?;
    let path = dir.join(log_file_name(chrono::Local::now().naive_local()));
    let file = File::create(&path)?;
    Ok((path, file))
}

/// Installs the global subscriber. `RUST_LOG` wins over the configured
/// level. Returns the debug log path when a log directory is configured.
pub fn init_logging(config: &LoggingConfig) -> std::io::Result<Option<PathBuf>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (log_path, file_layer) = match &config.log_dir {
        Some(dir) => {
            let (path, file) = open_log_file(dir)?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file));
            (Some(path), Some(layer))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    if let Some(path) = &log_path {
        tracing::info!(path = %path.display(), "writing debug log");
    }
    Ok(log_path)
}
