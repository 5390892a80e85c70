//! Integration tests for loading, overriding and writing configuration.

use serial_test::serial;
use streamflix::config::{
    load_config, load_config_or_default, save_config, Config, ENV_ANIME_API_URL,
    ENV_PROXY_URL, ENV_STORAGE_PATH, ENV_TMDB_API_KEY,
};

fn clear_env() {
    for name in [ENV_TMDB_API_KEY, ENV_ANIME_API_URL, ENV_PROXY_URL, ENV_STORAGE_PATH] {
        std::env::remove_var(name);
    }
}

#[test]
#[serial]
fn written_defaults_load_back() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conf").join("streamflix.toml");

    save_config(&path, &Config::default()).unwrap();
    let loaded = load_config(&path).unwrap();
    assert_eq!(loaded, Config::default());
}

#[test]
#[serial]
fn explicit_path_must_exist() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    let err = load_config_or_default(Some(&missing)).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to read config file"));
}

#[test]
#[serial]
fn sections_and_env_combine() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("streamflix.toml");
    std::fs::write(
        &path,
        r#"
[api]
tmdb_api_key = "from-file"
language = "ja-JP"

[retry]
max_retries = 3
retry_status_codes = [503]

[player]
resume_max_age_days = 7
"#,
    )
    .unwrap();

    std::env::set_var(ENV_TMDB_API_KEY, "from-env");
    std::env::set_var(ENV_PROXY_URL, "https://relay.example");
    let config = load_config(&path);
    clear_env();
    let config = config.unwrap();

    assert_eq!(config.api.tmdb_api_key, "from-env");
    assert_eq!(config.api.language, "ja-JP");
    assert_eq!(config.proxy.base_url, "https://relay.example");
    assert_eq!(config.retry.max_retries, 3);
    assert_eq!(config.retry.retry_status_codes, vec![503]);
    assert_eq!(config.retry.base_delay_ms, 1000);
    assert_eq!(
        config.player.resume_policy().max_age,
        std::time::Duration::from_secs(7 * 24 * 60 * 60)
    );
}

#[test]
#[serial]
fn invalid_values_are_rejected_on_load() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("streamflix.toml");
    std::fs::write(&path, "[proxy]\nbase_url = \"ftp://relay\"\n").unwrap();
    assert!(load_config(&path).is_err());

    std::fs::write(&path, "[retry]\njitter_factor = 1.5\n").unwrap();
    assert!(load_config(&path).is_err());

    std::fs::write(&path, "[cache]\nttl_secs = 0\n").unwrap();
    assert!(load_config(&path).is_err());
}
