//! Integration tests for configuration loading and credential resolution
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate FOURPLAY_* variables are marked with #[serial].

use fourplay_common::config::{
    load_config, load_toml_config, resolve_credential, Credentials, CredentialsConfig,
    DISCOGS_TOKEN_ENV, LASTFM_API_KEY_ENV,
};
use fourplay_common::Error;
use serial_test::serial;
use std::env;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_explicit_config_file() {
    let file = write_config(
        r#"
        host = "127.0.0.1"
        port = 5800
        user_agent = "FOURplay-Test/0.1"

        [logging]
        level = "debug"

        [cache]
        ttl_secs = 60
        sweep_interval_secs = 300

        [credentials]
        lastfm_api_key = "lfm-key"
        "#,
    );

    let config = load_config(Some(file.path())).unwrap();

    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 5800);
    assert_eq!(config.user_agent, "FOURplay-Test/0.1");
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.cache.ttl_secs, 60);
    assert_eq!(config.cache.sweep_interval_secs, 300);
    assert_eq!(config.credentials.lastfm_api_key.as_deref(), Some("lfm-key"));
    assert!(config.credentials.discogs_token.is_none());
}

#[test]
fn test_missing_explicit_config_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("does-not-exist.toml");

    let result = load_toml_config(&path);
    assert!(matches!(result, Err(Error::Io(_))));

    let result = load_config(Some(&path));
    assert!(
        matches!(result, Err(Error::Config(_))),
        "explicitly requested config must exist"
    );
}

#[test]
#[serial]
fn test_environment_credential_wins_over_toml() {
    env::set_var(LASTFM_API_KEY_ENV, "from-env");

    let key = resolve_credential("Last.fm API key", LASTFM_API_KEY_ENV, Some("from-toml"));
    assert_eq!(key.as_deref(), Some("from-env"));

    env::remove_var(LASTFM_API_KEY_ENV);
}

#[test]
#[serial]
fn test_toml_credential_used_without_environment() {
    env::remove_var(DISCOGS_TOKEN_ENV);

    let key = resolve_credential("Discogs token", DISCOGS_TOKEN_ENV, Some("  from-toml  "));
    assert_eq!(key.as_deref(), Some("from-toml"));
}

#[test]
#[serial]
fn test_blank_credentials_are_ignored() {
    env::set_var(DISCOGS_TOKEN_ENV, "   ");

    let key = resolve_credential("Discogs token", DISCOGS_TOKEN_ENV, Some(""));
    assert!(key.is_none());

    env::remove_var(DISCOGS_TOKEN_ENV);
}

#[test]
#[serial]
fn test_credentials_resolve_both_providers() {
    env::remove_var(LASTFM_API_KEY_ENV);
    env::set_var(DISCOGS_TOKEN_ENV, "env-token");

    let credentials = Credentials::resolve(&CredentialsConfig {
        lastfm_api_key: Some("toml-key".to_string()),
        discogs_token: None,
    });

    assert_eq!(credentials.lastfm_api_key.as_deref(), Some("toml-key"));
    assert_eq!(credentials.discogs_token.as_deref(), Some("env-token"));

    env::remove_var(DISCOGS_TOKEN_ENV);
}
