use crate::error::LlegoError;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Log file name inside the log directory
pub const LOG_FILE_NAME: &str = "llego.log";

/// Initialize tracing for the server
///
/// Console output plus an append-only `llego.log` in `log_dir`.
/// `RUST_LOG` takes precedence over `log_level`.
pub fn setup_logging(log_dir: &Path, log_level: &str) -> Result<(), LlegoError> {
    std::fs::create_dir_all(log_dir).map_err(|e| {
        LlegoError::config(format!(
            "Failed to create log directory {}: {}",
            log_dir.display(),
            e
        ))
    })?;

    let log_file_path = log_dir.join(LOG_FILE_NAME);
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)
        .map_err(|e| {
            LlegoError::config(format!(
                "Failed to open log file {}: {}",
                log_file_path.display(),
                e
            ))
        })?;

    let console_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_filter(env_filter(log_level));

    // Spans from tracing-actix-web carry the request id; keep their close events in the file
    let file_layer = fmt::layer()
        .with_writer(log_file)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(env_filter(log_level));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LlegoError::config(format!("Failed to install tracing subscriber: {}", e)))?;

    tracing::info!(
        level = %log_level,
        log_file = %log_file_path.display(),
        "Logging initialized"
    );

    Ok(())
}

/// Console-only tracing, used by one-shot CLI commands
pub fn setup_console_logging(log_level: &str) -> Result<(), LlegoError> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(env_filter(log_level))
        .try_init()
        .map_err(|e| LlegoError::config(format!("Failed to install tracing subscriber: {}", e)))?;

    Ok(())
}

fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = parse_log_level(log_level);
        // Quiet the HTTP and driver internals unless explicitly asked for
        EnvFilter::new(format!(
            "{},hyper=warn,reqwest=warn,mongodb=warn",
            level.as_str().to_lowercase()
        ))
    })
}

/// Parse string to tracing Level
pub fn parse_log_level(level: &str) -> Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to INFO", level);
            Level::INFO
        }
    }
}
