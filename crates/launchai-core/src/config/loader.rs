//! Config loader — reads `~/.launchai/config.json`, merges env vars, and
//! applies legacy migrations.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.launchai/config.json`
//! 3. Environment variables `LAUNCHAI_<SECTION>__<FIELD>` (override JSON)
//! 4. `ANTHROPIC_API_KEY` / `OPENAI_API_KEY`, only where no key is set yet
//!
//! Configured `pricing` entries are merged over the built-in price list, and
//! a zero `dispatch.timeoutSecs` is raised to the minimum with a warning.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{default_pricing, Config, ProviderConfig, MIN_TIMEOUT_SECS};

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    normalize(apply_env_overrides(load_config_from_path(&config_path)))
}

/// Fill in built-in prices for providers the config doesn't price, and
/// raise unusable dispatch values.
fn normalize(mut config: Config) -> Config {
    for (provider, rates) in default_pricing() {
        config.pricing.entry(provider).or_insert(rates);
    }

    if config.dispatch.timeout_secs < MIN_TIMEOUT_SECS {
        warn!(
            "dispatch.timeoutSecs = {} would fail every call; using {}s",
            config.dispatch.timeout_secs, MIN_TIMEOUT_SECS
        );
        config.dispatch.timeout_secs = MIN_TIMEOUT_SECS;
    }

    config
}

/// Load config from a specific file path, without env overrides.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return Config::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    let mut raw: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return Config::default();
        }
    };

    migrate_config(&mut raw);

    match serde_json::from_value(raw) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to deserialize config: {}", e);
            Config::default()
        }
    }
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply legacy config migrations.
///
/// Early configs named providers after their models: `providers.claude` and
/// `providers.gpt`. Those move to `providers.anthropic` / `providers.openai`
/// unless the new key is already present.
fn migrate_config(raw: &mut serde_json::Value) {
    let Some(providers) = raw.get_mut("providers").and_then(|p| p.as_object_mut()) else {
        return;
    };

    for (legacy, current) in [("claude", "anthropic"), ("gpt", "openai")] {
        if providers.contains_key(current) {
            continue;
        }
        if let Some(value) = providers.remove(legacy) {
            providers.insert(current.to_string(), value);
            debug!("Migrated providers.{legacy} → providers.{current}");
        }
    }
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `LAUNCHAI_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `LAUNCHAI_PROVIDERS__<NAME>__API_KEY` / `__API_BASE` / `__MODEL`
/// - `LAUNCHAI_DISPATCH__BACKOFF_MS`, `__TIMEOUT_SECS`, `__MAX_TOKENS`, `__TEMPERATURE`
/// - `LAUNCHAI_SERVER__HOST`, `LAUNCHAI_SERVER__PORT`
/// - `LAUNCHAI_STORAGE__ENABLED`, `LAUNCHAI_STORAGE__CONVERSATIONS_DIR`
fn apply_env_overrides(mut config: Config) -> Config {
    apply_provider_env(&mut config.providers.anthropic, "ANTHROPIC");
    apply_provider_env(&mut config.providers.openai, "OPENAI");

    // Dispatch
    if let Some(n) = env_parse::<u64>("LAUNCHAI_DISPATCH__BACKOFF_MS") {
        config.dispatch.backoff_ms = n;
    }
    if let Some(n) = env_parse::<u64>("LAUNCHAI_DISPATCH__TIMEOUT_SECS") {
        config.dispatch.timeout_secs = n;
    }
    if let Some(n) = env_parse::<u32>("LAUNCHAI_DISPATCH__MAX_TOKENS") {
        config.dispatch.max_tokens = n;
    }
    if let Some(t) = env_parse::<f64>("LAUNCHAI_DISPATCH__TEMPERATURE") {
        config.dispatch.temperature = t;
    }

    // Server
    if let Ok(val) = std::env::var("LAUNCHAI_SERVER__HOST") {
        config.server.host = val;
    }
    if let Some(p) = env_parse::<u16>("LAUNCHAI_SERVER__PORT") {
        config.server.port = p;
    }

    // Storage
    if let Ok(val) = std::env::var("LAUNCHAI_STORAGE__ENABLED") {
        config.storage.enabled = val == "true" || val == "1";
    }
    if let Ok(val) = std::env::var("LAUNCHAI_STORAGE__CONVERSATIONS_DIR") {
        config.storage.conversations_dir = Some(val);
    }

    config
}

/// Apply env var overrides for a single provider.
fn apply_provider_env(provider: &mut ProviderConfig, name: &str) {
    if let Ok(val) = std::env::var(format!("LAUNCHAI_PROVIDERS__{name}__API_KEY")) {
        provider.api_key = val;
    }
    if let Ok(val) = std::env::var(format!("LAUNCHAI_PROVIDERS__{name}__API_BASE")) {
        provider.api_base = Some(val);
    }
    if let Ok(val) = std::env::var(format!("LAUNCHAI_PROVIDERS__{name}__MODEL")) {
        provider.model = Some(val);
    }

    // Conventional vendor variable, only as a last resort
    if !provider.is_configured() {
        if let Ok(val) = std::env::var(format!("{name}_API_KEY")) {
            provider.api_key = val;
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let val = std::env::var(key).ok()?;
    match val.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring unparseable {}={}", key, val);
            None
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_missing_file() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.json"));
        assert_eq!(config.dispatch.backoff_ms, 1000);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_load_valid_json() {
        let file = write_temp_json(
            r#"{
            "dispatch": { "backoffMs": 200, "maxTokens": 1024 }
        }"#,
        );

        let config = load_config_from_path(file.path());
        assert_eq!(config.dispatch.backoff_ms, 200);
        assert_eq!(config.dispatch.max_tokens, 1024);
        // Default preserved
        assert_eq!(config.dispatch.temperature, 0.7);
    }

    #[test]
    fn test_load_invalid_json_returns_defaults() {
        let file = write_temp_json("not valid json {{{");
        let config = load_config_from_path(file.path());
        assert_eq!(config.dispatch.timeout_secs, 45);
    }

    #[test]
    fn test_load_wrong_types_returns_defaults() {
        let file = write_temp_json(r#"{ "server": { "port": "not-a-port" } }"#);
        let config = load_config_from_path(file.path());
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_partial_pricing_keeps_other_defaults() {
        let file = write_temp_json(
            r#"{ "pricing": { "openai": { "inputPer1k": 0.01, "outputPer1k": 0.03 } } }"#,
        );
        let config = normalize(load_config_from_path(file.path()));

        assert_eq!(config.pricing["openai"].input_per_1k, 0.01);
        assert_eq!(config.pricing["openai"].output_per_1k, 0.03);
        assert_eq!(config.pricing["anthropic"], default_pricing()["anthropic"]);
    }

    #[test]
    fn test_extra_pricing_entries_are_kept() {
        let file = write_temp_json(
            r#"{ "pricing": { "mistral": { "inputPer1k": 0.002, "outputPer1k": 0.006 } } }"#,
        );
        let config = normalize(load_config_from_path(file.path()));
        assert_eq!(config.pricing.len(), 3);
        assert_eq!(config.pricing["mistral"].output_per_1k, 0.006);
    }

    #[test]
    fn test_zero_timeout_raised_to_minimum() {
        let file = write_temp_json(r#"{ "dispatch": { "timeoutSecs": 0 } }"#);
        let config = normalize(load_config_from_path(file.path()));
        assert_eq!(config.dispatch.timeout_secs, MIN_TIMEOUT_SECS);

        let file = write_temp_json(r#"{ "dispatch": { "timeoutSecs": 3 } }"#);
        let config = normalize(load_config_from_path(file.path()));
        assert_eq!(config.dispatch.timeout_secs, 3);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.providers.openai.model = Some("gpt-4o-mini".to_string());
        config.providers.anthropic.api_key = "sk-ant-test".to_string();

        save_config(&config, Some(&path)).unwrap();

        let reloaded = load_config_from_path(&path);
        assert_eq!(reloaded.providers.openai.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(reloaded.providers.anthropic.api_key, "sk-ant-test");
    }

    #[test]
    fn test_migrate_legacy_provider_names() {
        let file = write_temp_json(
            r#"{
            "providers": {
                "claude": { "apiKey": "sk-ant-legacy" },
                "gpt": { "apiKey": "sk-legacy" }
            }
        }"#,
        );

        let config = load_config_from_path(file.path());
        assert_eq!(config.providers.anthropic.api_key, "sk-ant-legacy");
        assert_eq!(config.providers.openai.api_key, "sk-legacy");
    }

    #[test]
    fn test_migrate_no_overwrite() {
        let file = write_temp_json(
            r#"{
            "providers": {
                "anthropic": { "apiKey": "sk-ant-new" },
                "claude": { "apiKey": "sk-ant-legacy" }
            }
        }"#,
        );

        let config = load_config_from_path(file.path());
        assert_eq!(config.providers.anthropic.api_key, "sk-ant-new");
    }

    #[test]
    fn test_env_override_dispatch_backoff() {
        std::env::set_var("LAUNCHAI_DISPATCH__BACKOFF_MS", "5");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.dispatch.backoff_ms, 5);
        std::env::remove_var("LAUNCHAI_DISPATCH__BACKOFF_MS");
    }

    #[test]
    fn test_env_override_bad_value_ignored() {
        std::env::set_var("LAUNCHAI_DISPATCH__TIMEOUT_SECS", "soon");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.dispatch.timeout_secs, 45);
        std::env::remove_var("LAUNCHAI_DISPATCH__TIMEOUT_SECS");
    }

    #[test]
    fn test_env_override_provider_model() {
        std::env::set_var("LAUNCHAI_PROVIDERS__OPENAI__MODEL", "gpt-4.1");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.providers.openai.model.as_deref(), Some("gpt-4.1"));
        std::env::remove_var("LAUNCHAI_PROVIDERS__OPENAI__MODEL");
    }

    #[test]
    fn test_env_override_server_port() {
        std::env::set_var("LAUNCHAI_SERVER__PORT", "9999");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.server.port, 9999);
        std::env::remove_var("LAUNCHAI_SERVER__PORT");
    }

    #[test]
    fn test_vendor_key_does_not_override_config_key() {
        let mut provider = ProviderConfig {
            api_key: "sk-from-file".to_string(),
            ..Default::default()
        };
        std::env::set_var("ZZTEST_API_KEY", "sk-from-env");
        apply_provider_env(&mut provider, "ZZTEST");
        assert_eq!(provider.api_key, "sk-from-file");

        let mut empty = ProviderConfig::default();
        apply_provider_env(&mut empty, "ZZTEST");
        assert_eq!(empty.api_key, "sk-from-env");
        std::env::remove_var("ZZTEST_API_KEY");
    }

    #[test]
    fn test_saved_json_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        save_config(&Config::default(), Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert!(raw["dispatch"].get("timeoutSecs").is_some());
        assert!(raw["dispatch"].get("timeout_secs").is_none());
    }
}
