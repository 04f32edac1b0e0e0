use super::settings::Settings;
use super::{load_config, load_env_files};
use serial_test::serial;
use std::env;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

/// Runs `f` with the process working directory switched to a fresh temp dir.
fn in_temp_dir<F: FnOnce(&TempDir)>(f: F) {
    let tmp = TempDir::new().expect("create tempdir");
    let orig = env::current_dir().expect("current_dir");
    env::set_current_dir(tmp.path()).expect("set current dir");
    f(&tmp);
    env::set_current_dir(orig).expect("restore cwd");
}

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.server.host, "0.0.0.0");
    assert_eq!(settings.server.port, 8000);
    assert!(!settings.server.debug);
    assert_eq!(settings.server.origins, vec!["*".to_string()]);
    assert_eq!(settings.messenger.address(), "localhost:61613");
    assert_eq!(settings.messenger.connection_timeout(), Duration::from_secs(10));
    assert_eq!(settings.messenger.heartbeat, (0, 0));
    assert_eq!(settings.messenger.client_id, "orion");
    assert!(settings.messenger.credentials().is_none());
}

#[test]
fn test_credentials_require_both_parts() {
    let mut messenger = Settings::default().messenger;
    messenger.username = Some("user".to_string());
    assert!(messenger.credentials().is_none());

    messenger.password = Some("pass".to_string());
    assert_eq!(messenger.credentials(), Some(("user", "pass")));

    messenger.username = None;
    assert!(messenger.credentials().is_none());
}

#[test]
fn test_debug_forces_debug_log_level() {
    let mut server = Settings::default().server;
    assert_eq!(server.effective_log_level(), "info");
    server.debug = true;
    assert_eq!(server.effective_log_level(), "debug");
}

#[test]
#[serial]
fn load_config_without_sources_returns_defaults() {
    in_temp_dir(|_| {
        let cfg = load_config().expect("load_config failed");
        assert_eq!(cfg, Settings::default());
    });
}

#[test]
#[serial]
fn load_config_from_file_overrides_defaults() {
    in_temp_dir(|_| {
        fs::create_dir_all("config").expect("create config dir");
        let toml = r#"
            [server]
            port = 9000
            debug = true

            [messenger]
            host = "activemq"
            heartbeat = [1000, 2000]
            username = "user"
            password = "pass"
        "#;
        fs::write("config/default.toml", toml).expect("write config file");

        let cfg = load_config().expect("load_config failed");
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 9000);
        assert!(cfg.server.debug);
        assert_eq!(cfg.messenger.host, "activemq");
        assert_eq!(cfg.messenger.port, 61613);
        assert_eq!(cfg.messenger.heartbeat, (1000, 2000));
        assert_eq!(cfg.messenger.credentials(), Some(("user", "pass")));
    });
}

#[test]
#[serial]
fn load_config_from_environment() {
    in_temp_dir(|_| {
        temp_env::with_vars(
            [
                ("ORION_SERVER__PORT", Some("8081")),
                ("ORION_SERVER__ORIGINS", Some("http://a.test,http://b.test")),
                ("ORION_MESSENGER__HOST", Some("broker.internal")),
                ("ORION_MESSENGER__CONNECTION_TIMEOUT_MS", Some("2500")),
                ("ORION_MESSENGER__HEARTBEAT", Some("4000,4000")),
                ("ORION_MESSENGER__DEFAULT_DESTINATION", Some("/queue/cases")),
            ],
            || {
                let cfg = load_config().expect("load_config failed");
                assert_eq!(cfg.server.port, 8081);
                assert_eq!(
                    cfg.server.origins,
                    vec!["http://a.test".to_string(), "http://b.test".to_string()]
                );
                assert_eq!(cfg.messenger.host, "broker.internal");
                assert_eq!(cfg.messenger.connection_timeout(), Duration::from_millis(2500));
                assert_eq!(cfg.messenger.heartbeat, (4000, 4000));
                assert_eq!(cfg.messenger.default_destination, "/queue/cases");
            },
        );
    });
}

#[test]
#[serial]
fn env_files_fill_missing_variables_only() {
    in_temp_dir(|_| {
        fs::write(".env.local", "ORION_DOTENV_TEST_A=local\n").expect("write .env.local");
        fs::write(
            ".env",
            "ORION_DOTENV_TEST_A=shared\nORION_DOTENV_TEST_B=shared\nORION_DOTENV_TEST_C=shared\n",
        )
        .expect("write .env");

        temp_env::with_vars(
            [
                ("ORION_DOTENV_TEST_A", None),
                ("ORION_DOTENV_TEST_B", None),
                ("ORION_DOTENV_TEST_C", Some("process")),
            ],
            || {
                assert!(load_env_files().is_empty());
                assert_eq!(env::var("ORION_DOTENV_TEST_A").as_deref(), Ok("local"));
                assert_eq!(env::var("ORION_DOTENV_TEST_B").as_deref(), Ok("shared"));
                assert_eq!(env::var("ORION_DOTENV_TEST_C").as_deref(), Ok("process"));
            },
        );
    });
}

#[test]
#[serial]
fn malformed_env_file_is_reported() {
    in_temp_dir(|_| {
        fs::write(".env", "not a valid line\n").expect("write .env");

        let warnings = load_env_files();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Ignoring .env: "));
    });
}
