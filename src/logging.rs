//! Logging setup.
//!
//! Logs always go to the console. Depending on configuration they are also
//! sent to systemd's journal (Linux) and/or a daily rotated file.
//!
//! The filter comes from the `CATTRACK_LOG` environment variable when set,
//! otherwise from `logging.level` in the config file:
//! - `CATTRACK_LOG=debug` for verbose output
//! - `CATTRACK_LOG=info` for standard output (default)
//! - `CATTRACK_LOG=cattrack=debug,tower=warn` for per-target filtering

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

/// Initialize the logging system. Call once at startup.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_env("CATTRACK_LOG")
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let mut layers: Vec<BoxedLayer> = vec![fmt::layer().with_target(true).boxed()];

    if let Some(log_dir) = &config.log_dir {
        std::fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

        let file_appender = tracing_appender::rolling::daily(log_dir, "cattrack.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // The guard flushes on drop and must live as long as the process
        static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
            std::sync::OnceLock::new();
        let _ = GUARD.set(guard);

        layers.push(fmt::layer().with_writer(non_blocking).with_ansi(false).boxed());
    }

    #[cfg(target_os = "linux")]
    if config.journald {
        match tracing_journald::layer() {
            Ok(journald_layer) => layers.push(journald_layer.boxed()),
            Err(e) => eprintln!("journald unavailable, continuing without it: {e}"),
        }
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(
        file = config.log_dir.is_some(),
        journald = config.journald,
        "Logging initialized"
    );
    Ok(())
}
