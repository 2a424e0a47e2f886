//! Structured logging setup, generalizing the teacher's
//! `fmt().with_env_filter(...)` one-liner to the `logger_*` config knobs
//! from §6 (preset, level, encoding, output paths).

use std::fs::OpenOptions;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use crate::config::schema::LoggerSection;

/// Initialise the global `tracing` subscriber from a [`LoggerSection`].
/// Idempotent guard is the caller's responsibility (call once at startup).
pub fn init(cfg: &LoggerSection) -> Result<(), String> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.level.clone()));

    let writer = make_writer(&cfg.output_paths)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer);

    match (cfg.preset.as_str(), cfg.encoding.as_str()) {
        (_, "json") => builder.json().try_init(),
        ("dev", _) => builder.pretty().try_init(),
        _ => builder.try_init(),
    }
    .map_err(|e| format!("installing tracing subscriber: {e}"))
}

/// Resolve the primary output sink from `output_paths`. `"stdout"`/
/// `"stderr"` are recognised specially; anything else is opened as an
/// append-only file path, the convention `original_source`'s
/// `internal/logger` uses. Only the first path is honored — multiple
/// simultaneous sinks are a CLI/operator concern, not this guard's.
fn make_writer(paths: &[String]) -> Result<BoxMakeWriter, String> {
    match paths.first().map(String::as_str) {
        None | Some("stderr") => Ok(BoxMakeWriter::new(std::io::stderr)),
        Some("stdout") => Ok(BoxMakeWriter::new(std::io::stdout)),
        Some(file) => {
            let handle = OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .map_err(|e| format!("opening log output {file}: {e}"))?;
            Ok(BoxMakeWriter::new(std::sync::Mutex::new(handle)))
        }
    }
}
