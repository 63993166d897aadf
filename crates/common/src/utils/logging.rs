use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, fmt::writer::MakeWriterExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,tower_http=info,axum=info,sqlx=warn";

/// Initialize tracing subscriber with sensible defaults and stdout writer.
/// - Respects `RUST_LOG` if set
/// - Falls back to `info,tower_http=info,axum=info`
/// - Writes to stdout to improve visibility in environments that hide stderr
pub fn init_logging_default() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}

/// Initialize tracing subscriber with JSON structured output.
/// - Respects `RUST_LOG` if set, defaults to `info`
/// - Emits structured JSON logs for better machine parsing
pub fn init_logging_json() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .json()
        .with_writer(io::stdout)
        .try_init();
}

fn open_log_file(dir: &str) -> io::Result<File> {
    std::fs::create_dir_all(dir)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(Path::new(dir).join("bank-api.log"))
}

/// Initialize logging to stdout plus an append-only file in `dir`.
///
/// Falls back to stdout only when the file cannot be opened.
pub fn init_logging_with_dir(dir: &str, json: bool) {
    let file = match open_log_file(dir) {
        Ok(f) => f,
        Err(e) => {
            if json { init_logging_json() } else { init_logging_default() }
            tracing::warn!(%dir, error = %e, "cannot open log file; logging to stdout only");
            return;
        }
    };
    let writer = io::stdout.and(Mutex::new(file));
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = fmt().with_env_filter(env_filter).with_target(false).with_ansi(false);
    let _ = if json {
        builder.json().with_writer(writer).try_init()
    } else {
        builder.compact().with_writer(writer).try_init()
    };
}
