use std::sync::Mutex;

use abf_guard::config::load_from_str;

/// `Environment::with_prefix` reads the whole process environment, so tests
/// that set `ABF_*` vars must not run concurrently with one another.
static ENV_LOCK: Mutex<()> = Mutex::new(());

const MINIMAL: &str = r#"
db:
  host: localhost
  dbname: abf
  user: abfuser
  password: abfpassword
"#;

#[test]
fn minimal_config_fills_in_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let cfg = load_from_str(MINIMAL).unwrap();
    assert_eq!(cfg.main.max_logins, 10);
    assert_eq!(cfg.api_server.port, 8080);
    assert_eq!(cfg.logger.encoding, "json");
    assert_eq!(cfg.db.port, 5432);
}

#[test]
fn unknown_top_level_field_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let yaml = format!("{MINIMAL}\nbogus: true\n");
    assert!(load_from_str(&yaml).is_err());
}

#[test]
fn env_override_beats_file() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    std::env::set_var("ABF_MAIN__MAX_LOGINS", "42");
    let cfg = load_from_str(MINIMAL).unwrap();
    std::env::remove_var("ABF_MAIN__MAX_LOGINS");
    assert_eq!(cfg.main.max_logins, 42);
}

#[test]
fn invalid_logger_level_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let yaml = format!("{MINIMAL}\nlogger:\n  level: nonsense\n");
    assert!(load_from_str(&yaml).is_err());
}

#[test]
fn zero_capacity_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let yaml = format!("{MINIMAL}\nmain:\n  max_logins: 0\n");
    assert!(load_from_str(&yaml).is_err());
}
