use super::*;

use std::sync::Mutex;

// Env vars are process-global; serialize the tests that touch them.
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// # Safety
/// Callers must hold `ENV_LOCK`.
unsafe fn clear_leave_env() {
    unsafe {
        std::env::remove_var("LEAVE_API_BASE_URL");
        std::env::remove_var("LEAVE_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("LEAVE_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("LEAVE_SESSION_FILE");
    }
}

#[test]
fn from_env_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe { clear_leave_env() };

    let cfg = AuthConfig::from_env().unwrap();
    assert_eq!(cfg.base_url, DEFAULT_API_BASE_URL);
    assert_eq!(
        cfg.timeouts,
        AuthTimeouts { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    );
    assert_eq!(cfg.session_file, PathBuf::from(DEFAULT_SESSION_FILE));
}

#[test]
fn from_env_parses_overrides() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_leave_env();
        std::env::set_var("LEAVE_API_BASE_URL", "https://leave.example.test/api/");
        std::env::set_var("LEAVE_REQUEST_TIMEOUT_SECS", "42");
        std::env::set_var("LEAVE_CONNECT_TIMEOUT_SECS", "7");
        std::env::set_var("LEAVE_SESSION_FILE", "/tmp/leave-session.json");
    }

    let cfg = AuthConfig::from_env().unwrap();
    assert_eq!(cfg.base_url, "https://leave.example.test/api");
    assert_eq!(cfg.timeouts, AuthTimeouts { request_secs: 42, connect_secs: 7 });
    assert_eq!(cfg.session_file, PathBuf::from("/tmp/leave-session.json"));

    unsafe { clear_leave_env() };
}

#[test]
fn from_env_rejects_bad_timeout() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_leave_env();
        std::env::set_var("LEAVE_REQUEST_TIMEOUT_SECS", "soon");
    }

    let err = AuthConfig::from_env().unwrap_err().to_string();
    assert!(err.contains("LEAVE_REQUEST_TIMEOUT_SECS"));

    unsafe {
        std::env::set_var("LEAVE_REQUEST_TIMEOUT_SECS", "0");
    }
    assert!(AuthConfig::from_env().is_err());

    unsafe { clear_leave_env() };
}

#[test]
fn from_env_rejects_bad_base_url() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_leave_env();
        std::env::set_var("LEAVE_API_BASE_URL", "localhost:5000");
    }

    let err = AuthConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidBaseUrl(_)));

    unsafe { clear_leave_env() };
}

#[test]
fn normalize_base_url_shapes() {
    assert_eq!(normalize_base_url(" http://127.0.0.1:5000/ ").unwrap(), "http://127.0.0.1:5000");
    assert!(normalize_base_url("http://").is_err());
    assert!(normalize_base_url("ftp://host").is_err());
}

#[test]
fn with_base_url_overrides() {
    let cfg = AuthConfig {
        base_url: DEFAULT_API_BASE_URL.to_owned(),
        timeouts: AuthTimeouts { request_secs: 1, connect_secs: 1 },
        session_file: PathBuf::from(DEFAULT_SESSION_FILE),
    };
    let cfg = cfg.with_base_url("https://other.test/").unwrap();
    assert_eq!(cfg.base_url, "https://other.test");
}
