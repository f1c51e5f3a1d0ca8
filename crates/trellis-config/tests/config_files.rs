//! Loading configuration from files on disk.

use std::io::Write;

use tempfile::NamedTempFile;
use trellis_config::{ConfigError, ConfigLoader, LogFormat};

fn file_with(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_toml_file() {
    let file = file_with(
        ".toml",
        r#"
        [server]
        http_addr = "127.0.0.1:7000"
        body_timeout_ms = 2500

        [logging]
        level = "warn"
        format = "pretty"

        [metrics]
        enabled = true
        addr = "127.0.0.1:9100"
        "#,
    );

    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .load_with_env(Vec::new())
        .unwrap();

    assert_eq!(config.server.http_addr, "127.0.0.1:7000");
    assert_eq!(config.server.body_timeout_ms, 2500);
    assert_eq!(config.logging.format, LogFormat::Pretty);
    assert_eq!(config.metrics.addr.as_deref(), Some("127.0.0.1:9100"));
    assert_eq!(
        config.server_config().body_timeout(),
        std::time::Duration::from_millis(2500)
    );
}

#[test]
fn test_json_file_with_env_on_top() {
    let file = file_with(".json", r#"{"server": {"http_addr": "127.0.0.1:7001"}}"#);

    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .with_env_prefix("SVC")
        .load_with_env(vec![(
            "SVC__SERVER__HTTP_ADDR".to_string(),
            "127.0.0.1:7002".to_string(),
        )])
        .unwrap();

    assert_eq!(config.server.http_addr, "127.0.0.1:7002");
}

#[test]
fn test_unknown_field_in_file() {
    let file = file_with(".toml", "[server]\nport = 80\n");
    let err = ConfigLoader::new().with_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::TomlError(_)));
}

#[test]
fn test_unsupported_extension() {
    let file = file_with(".yaml", "server: {}\n");
    let err = ConfigLoader::new().with_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("unsupported configuration file format"));
}
