mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variables that override values from the config file.
pub const ENV_TMDB_API_KEY: &str = "STREAMFLIX_TMDB_API_KEY";
pub const ENV_ANIME_API_URL: &str = "STREAMFLIX_ANIME_API_URL";
pub const ENV_PROXY_URL: &str = "STREAMFLIX_PROXY_URL";
pub const ENV_STORAGE_PATH: &str = "STREAMFLIX_STORAGE_PATH";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    apply_env_overrides(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./streamflix.toml",
        "./config.toml",
        "~/.config/streamflix/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    let mut config = Config::default();
    apply_env_overrides(&mut config);
    validate_config(&config)?;
    Ok(config)
}

/// Write `config` as pretty TOML.
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    let content = toml::to_string_pretty(config).with_context(|| "Failed to serialize config")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    Ok(())
}

/// Apply `STREAMFLIX_*` environment variables on top of the file values.
pub fn apply_env_overrides(config: &mut Config) {
    if let Some(key) = env_value(ENV_TMDB_API_KEY) {
        config.api.tmdb_api_key = key;
    }
    if let Some(url) = env_value(ENV_ANIME_API_URL) {
        config.api.anime_base_url = url;
    }
    if let Some(url) = env_value(ENV_PROXY_URL) {
        config.proxy.base_url = url;
    }
    if let Some(path) = env_value(ENV_STORAGE_PATH) {
        config.storage.path = PathBuf::from(path);
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    for (name, url) in [
        ("api.anime_base_url", &config.api.anime_base_url),
        ("api.tmdb_base_url", &config.api.tmdb_base_url),
        ("api.tmdb_image_base_url", &config.api.tmdb_image_base_url),
        ("proxy.base_url", &config.proxy.base_url),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!("{} must be an http(s) URL, got '{}'", name, url);
        }
    }

    if config.api.request_timeout_secs == 0 || config.api.stream_timeout_secs == 0 {
        anyhow::bail!("Request timeouts cannot be 0");
    }

    if !(0.0..=1.0).contains(&config.retry.jitter_factor) {
        anyhow::bail!(
            "retry.jitter_factor must be between 0 and 1, got {}",
            config.retry.jitter_factor
        );
    }
    if config.retry.base_delay_ms > config.retry.max_delay_ms {
        anyhow::bail!("retry.base_delay_ms cannot exceed retry.max_delay_ms");
    }

    if config.cache.ttl_secs == 0 {
        anyhow::bail!("cache.ttl_secs cannot be 0");
    }
    if config.cache.sweep_interval_secs == 0 {
        anyhow::bail!("cache.sweep_interval_secs cannot be 0");
    }
    if config.player.progress_interval_secs == 0 {
        anyhow::bail!("player.progress_interval_secs cannot be 0");
    }

    if config.api.tmdb_api_key.is_empty() {
        tracing::warn!("No TMDB API key configured; movie and TV lookups are disabled");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn clear_env() {
        for name in [
            ENV_TMDB_API_KEY,
            ENV_ANIME_API_URL,
            ENV_PROXY_URL,
            ENV_STORAGE_PATH,
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.retry.max_retries, 1);
        assert_eq!(config.cache.ttl_secs, 300);
        assert_eq!(config.player.progress_interval_secs, 5);
    }

    #[test]
    #[serial]
    fn partial_file_keeps_defaults() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("streamflix.toml");
        std::fs::write(
            &path,
            r#"
[api]
language = "ja-JP"

[retry]
max_retries = 3
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.api.language, "ja-JP");
        assert_eq!(config.api.tmdb_base_url, "https://api.themoviedb.org/3");
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.base_delay_ms, 1000);
        assert_eq!(config.proxy, ProxyConfig::default());
    }

    #[test]
    #[serial]
    fn env_overrides_file_values() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api]\ntmdb_api_key = \"from-file\"\n").unwrap();

        std::env::set_var(ENV_TMDB_API_KEY, "from-env");
        std::env::set_var(ENV_PROXY_URL, "http://localhost:9000");
        let config = load_config(&path);
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.api.tmdb_api_key, "from-env");
        assert_eq!(config.proxy.base_url, "http://localhost:9000");
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = Config::default();
        config.retry.jitter_factor = 1.5;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.proxy.base_url = "ftp://relay".into();
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.cache.ttl_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/config.toml");
        let mut config = Config::default();
        config.api.language = "fr-FR".into();

        save_config(&path, &config).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let loaded: Config = toml::from_str(&text).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn storage_path_expands_tilde() {
        let config = StorageConfig::default();
        let resolved = config.resolved_path();
        assert!(!resolved.to_string_lossy().starts_with('~'));
        assert!(resolved.ends_with(".local/share/streamflix/storage.json"));
    }
}
