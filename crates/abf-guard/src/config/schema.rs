//! Config schema with strict parsing (`deny_unknown_fields`), the same
//! discipline the teacher's `wsprism-gateway::config::schema` applies.

use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration, assembled from `main`, `logger`, `db` and
/// `api_server` sections. Mirrors `original_source`'s `config.Config`.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct GuardConfig {
    #[serde(default)]
    pub main: MainSection,
    #[serde(default)]
    pub logger: LoggerSection,
    pub db: DbSection,
    #[serde(default, rename = "api_server")]
    pub api_server: ApiServerSection,
}

impl GuardConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.main.max_logins == 0 || self.main.max_passwords == 0 || self.main.max_ips == 0 {
            return Err("main.max_logins/max_passwords/max_ips must be > 0".into());
        }
        if self.main.cache_size == 0 {
            return Err("main.cache_size must be > 0".into());
        }
        if self.db.host.is_empty() || self.db.dbname.is_empty() || self.db.user.is_empty() {
            return Err("db.host, db.dbname and db.user are required".into());
        }
        const ALLOWED_PRESETS: &[&str] = &["dev", "prod"];
        if !ALLOWED_PRESETS.contains(&self.logger.preset.as_str()) {
            return Err(format!(
                "invalid logger.preset {:?}, allowed values are {ALLOWED_PRESETS:?}",
                self.logger.preset
            ));
        }
        const ALLOWED_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
        if !ALLOWED_LEVELS.contains(&self.logger.level.as_str()) {
            return Err(format!(
                "invalid logger.level {:?}, allowed values are {ALLOWED_LEVELS:?}",
                self.logger.level
            ));
        }
        const ALLOWED_ENCODINGS: &[&str] = &["console", "json"];
        if !ALLOWED_ENCODINGS.contains(&self.logger.encoding.as_str()) {
            return Err(format!(
                "invalid logger.encoding {:?}, allowed values are {ALLOWED_ENCODINGS:?}",
                self.logger.encoding
            ));
        }
        Ok(())
    }
}

/// Rate-limit capacities, cache sizing and bucket sweep period (§6).
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct MainSection {
    #[serde(default = "default_max_logins")]
    pub max_logins: u32,
    #[serde(default = "default_max_passwords")]
    pub max_passwords: u32,
    #[serde(default = "default_max_ips")]
    pub max_ips: u32,
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
    #[serde(default = "default_cache_ttl", with = "humantime_duration")]
    pub cache_ttl: Duration,
    #[serde(default = "default_bucket_ttl", with = "humantime_duration")]
    pub bucket_ttl: Duration,
}

impl Default for MainSection {
    fn default() -> Self {
        Self {
            max_logins: default_max_logins(),
            max_passwords: default_max_passwords(),
            max_ips: default_max_ips(),
            cache_size: default_cache_size(),
            cache_ttl: default_cache_ttl(),
            bucket_ttl: default_bucket_ttl(),
        }
    }
}

fn default_max_logins() -> u32 {
    10
}
fn default_max_passwords() -> u32 {
    10
}
fn default_max_ips() -> u32 {
    10
}
fn default_cache_size() -> usize {
    10
}
fn default_cache_ttl() -> Duration {
    Duration::from_secs(60)
}
fn default_bucket_ttl() -> Duration {
    Duration::from_secs(5 * 60)
}

/// Structured logging knobs, passed straight to `abf_guard::logger::init`.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct LoggerSection {
    #[serde(default = "default_log_preset")]
    pub preset: String,
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_encoding")]
    pub encoding: String,
    #[serde(default = "default_output_paths")]
    pub output_paths: Vec<String>,
    #[serde(default = "default_output_paths")]
    pub error_output_paths: Vec<String>,
}

impl Default for LoggerSection {
    fn default() -> Self {
        Self {
            preset: default_log_preset(),
            level: default_log_level(),
            encoding: default_log_encoding(),
            output_paths: default_output_paths(),
            error_output_paths: default_output_paths(),
        }
    }
}

fn default_log_preset() -> String {
    "prod".into()
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_encoding() -> String {
    "json".into()
}
fn default_output_paths() -> Vec<String> {
    vec!["stderr".into()]
}

/// ListStore connection parameters.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct DbSection {
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    #[serde(default = "default_sslmode")]
    pub sslmode: String,
    #[serde(default = "default_db_timeout", with = "humantime_duration")]
    pub timeout: Duration,
}

fn default_db_port() -> u16 {
    5432
}
fn default_sslmode() -> String {
    "require".into()
}
fn default_db_timeout() -> Duration {
    Duration::from_secs(3)
}

/// RPC listener bind address.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ApiServerSection {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiServerSection {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
        }
    }
}

fn default_api_host() -> String {
    "0.0.0.0".into()
}
fn default_api_port() -> u16 {
    8080
}

/// (De)serialise a `Duration` from a plain integer number of seconds, the
/// unit the reference implementation's YAML/env config uses.
mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(de: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(de)?;
        Ok(Duration::from_secs(secs))
    }
}
