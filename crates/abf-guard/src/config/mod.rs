//! Layered configuration loading, in the shape of the teacher's
//! `wsprism-gateway::config` module: a YAML file overridden by `ABF_`
//! prefixed environment variables, parsed strictly via [`schema`].

pub mod schema;

pub use schema::{ApiServerSection, DbSection, GuardConfig, LoggerSection, MainSection};

use config::{Config, Environment, File};

/// Load configuration from `path`, then apply `ABF_*` environment overrides
/// (e.g. `ABF_DB__HOST`), then validate.
pub fn load_from_file(path: &str) -> Result<GuardConfig, String> {
    let raw = Config::builder()
        .add_source(File::with_name(path))
        .add_source(Environment::with_prefix("ABF").separator("__").try_parsing(true))
        .build()
        .map_err(|e| format!("loading config from {path}: {e}"))?;

    build(raw)
}

/// Load configuration from an in-memory YAML string, used by tests and by
/// callers that already hold the document (e.g. the CLI's `--config -`).
pub fn load_from_str(yaml: &str) -> Result<GuardConfig, String> {
    let raw = Config::builder()
        .add_source(File::from_str(yaml, config::FileFormat::Yaml))
        .add_source(Environment::with_prefix("ABF").separator("__").try_parsing(true))
        .build()
        .map_err(|e| format!("parsing inline config: {e}"))?;

    build(raw)
}

fn build(raw: Config) -> Result<GuardConfig, String> {
    let cfg: GuardConfig = raw
        .try_deserialize()
        .map_err(|e| format!("deserializing config: {e}"))?;
    cfg.validate()?;
    Ok(cfg)
}
