//! Integration tests for configuration management
//!
//! These tests verify that the Config struct can be properly loaded,
//! validated, and processed with path expansion.

use docsum_engine::config::Config;
use docsum_sdk::errors::ClientError;
use std::io::Write;

#[test]
fn test_config_toml_parsing() {
    let dir = tempfile::tempdir().unwrap();
    let downloads = dir.path().join("exports");
    let toml_content = format!(
        r#"
[core]
log_level = "debug"
download_dir = "{}"

[api]
base_url = "https://docs.example.com/api/"

[upload]
accepted_extensions = [".pdf", ".md"]
max_file_size_mb = 25
"#,
        downloads.display()
    );

    let config = Config::from_toml_str(&toml_content).unwrap();

    assert_eq!(config.core.log_level, "debug");
    assert_eq!(config.core.download_dir, downloads);
    assert!(downloads.is_dir(), "download directory should be created");
    assert_eq!(config.api.base_url, "https://docs.example.com/api");
    assert_eq!(config.upload.accepted_extensions, vec![".pdf", ".md"]);
    assert_eq!(config.upload.max_file_size_bytes(), 25 * 1024 * 1024);
}

#[test]
fn test_missing_sections_use_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let toml_content = format!("[core]\ndownload_dir = \"{}\"\n", dir.path().display());

    let config = Config::from_toml_str(&toml_content).unwrap();

    assert_eq!(config.core.log_level, "info");
    assert_eq!(config.api.base_url, "http://localhost:8000/api");
    assert_eq!(
        config.upload.accepted_extensions,
        vec![".pdf", ".docx", ".doc", ".txt"]
    );
    assert_eq!(config.upload.max_file_size_mb, 10);
}

#[test]
fn test_invalid_base_url_is_rejected() {
    let err = Config::from_toml_str("[api]\nbase_url = \"localhost:8000\"\n").unwrap_err();

    assert!(matches!(err, ClientError::Config(_)));
    assert!(err.to_string().contains("base_url"));
}

#[test]
fn test_invalid_log_level_is_rejected() {
    let err = Config::from_toml_str("[core]\nlog_level = \"loud\"\n").unwrap_err();
    assert!(err.to_string().contains("Invalid log level"));
}

#[test]
fn test_load_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut file = tempfile::NamedTempFile::new_in(dir.path()).unwrap();
    writeln!(
        file,
        "[core]\ndownload_dir = \"{}\"\n\n[api]\nbase_url = \"http://127.0.0.1:9000/api\"",
        dir.path().display()
    )
    .unwrap();

    let config = Config::load_from_path(file.path()).unwrap();
    assert_eq!(config.api.base_url, "http://127.0.0.1:9000/api");
}

#[test]
fn test_load_from_missing_path_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load_from_path(&dir.path().join("missing.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
