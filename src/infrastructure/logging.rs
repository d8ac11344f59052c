//! Logging system configuration and initialization
//!
//! Console output always uses a wall-clock `HH:MM:SS` timestamp. File output
//! goes through a non-blocking appender whose guard lives for the rest of the
//! process. `RUST_LOG` overrides the configured filter entirely.

use anyhow::{Result, anyhow};
use chrono::Local;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<WorkerGuard>> = Mutex::new(Vec::new());
}

pub const LOG_FILE_NAME: &str = "catalog-sync.log";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `catalog_sync=debug`
    pub level: String,
    pub json_format: bool,
    pub console_output: bool,
    pub file_output: bool,
    pub log_directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            log_directory: PathBuf::from("logs"),
        }
    }
}

/// `[HH:MM:SS]` in local time
struct ClockTime;

impl FormatTime for ClockTime {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "[{}]", Local::now().format("%H:%M:%S"))
    }
}

/// Filter for the configured level, with noisy dependencies capped at `warn`
/// unless tracing everything.
pub fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| anyhow!("Invalid log level {:?}: {}", config.level, e))?;

    if !config.level.to_lowercase().contains("trace") {
        for directive in ["sqlx=warn", "reqwest=warn", "hyper=warn", "hyper_util=warn", "h2=warn"] {
            filter = filter.add_directive(directive.parse()?);
        }
    }

    Ok(filter)
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_env_filter(config)?,
    };

    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.console_output {
        let console = fmt::Layer::new()
            .with_writer(std::io::stdout)
            .with_timer(ClockTime)
            .with_target(false);
        layers.push(if config.json_format { console.json().boxed() } else { console.boxed() });
    }

    if config.file_output {
        std::fs::create_dir_all(&config.log_directory).map_err(|e| {
            anyhow!("Failed to create log directory {:?}: {}", config.log_directory, e)
        })?;
        let file_appender = rolling::never(&config.log_directory, LOG_FILE_NAME);
        let (file_writer, file_guard) = non_blocking(file_appender);
        LOG_GUARDS
            .lock()
            .map_err(|_| anyhow!("Log guard registry poisoned"))?
            .push(file_guard);

        let file = fmt::Layer::new()
            .with_writer(file_writer)
            .with_timer(ClockTime)
            .with_target(false)
            .with_ansi(false);
        layers.push(if config.json_format { file.json().boxed() } else { file.boxed() });
    }

    if layers.is_empty() {
        return Err(anyhow!("No logging output configured"));
    }

    Registry::default()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow!("Failed to install subscriber: {}", e))?;

    info!("Logging system initialized");
    info!("Log level: {}", config.level);
    if config.file_output {
        info!("Log file: {:?}", config.log_directory.join(LOG_FILE_NAME));
    }
    Ok(())
}
