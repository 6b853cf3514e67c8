use std::{collections::HashMap, fs, path::Path};

use anyhow::bail;
use shared::domain::Variant;
use tracing::warn;

pub const CONFIG_FILE: &str = "bagua.toml";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub default_variant: Variant,
    pub surface_load_errors: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: 30,
            default_variant: Variant::Abstract,
            surface_load_errors: false,
        }
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(CONFIG_FILE), |key| std::env::var(key).ok())
}

/// File values first, then environment overrides. Unparseable values are
/// skipped with a warning.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, env);

    settings
}

pub(crate) fn apply_file(settings: &mut Settings, raw: &str) {
    let file_cfg = match toml::from_str::<HashMap<String, toml::Value>>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(err) => {
            warn!(error = %err, "config: ignoring unreadable {CONFIG_FILE}");
            return;
        }
    };
    let text = |key: &str| {
        file_cfg.get(key).map(|value| match value {
            toml::Value::String(text) => text.clone(),
            other => other.to_string(),
        })
    };

    if let Some(v) = text("base_url") {
        settings.base_url = v;
    }
    if let Some(v) = text("timeout_secs") {
        set_timeout(settings, "timeout_secs", &v);
    }
    if let Some(v) = text("default_variant") {
        set_variant(settings, "default_variant", &v);
    }
    if let Some(v) = text("surface_load_errors") {
        set_flag(settings, "surface_load_errors", &v);
    }
}

pub(crate) fn apply_env(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("BAGUA_BASE_URL") {
        settings.base_url = v;
    }
    if let Some(v) = env("APP__BASE_URL") {
        settings.base_url = v;
    }

    if let Some(v) = env("BAGUA_TIMEOUT_SECS") {
        set_timeout(settings, "BAGUA_TIMEOUT_SECS", &v);
    }

    if let Some(v) = env("BAGUA_DEFAULT_VARIANT") {
        set_variant(settings, "BAGUA_DEFAULT_VARIANT", &v);
    }

    if let Some(v) = env("BAGUA_SURFACE_LOAD_ERRORS") {
        set_flag(settings, "BAGUA_SURFACE_LOAD_ERRORS", &v);
    }
}

fn set_timeout(settings: &mut Settings, source: &str, raw: &str) {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => settings.timeout_secs = secs,
        _ => warn!(source, value = raw, "config: ignoring invalid timeout"),
    }
}

fn set_variant(settings: &mut Settings, source: &str, raw: &str) {
    match raw.trim().parse::<Variant>() {
        Ok(variant) => settings.default_variant = variant,
        Err(err) => warn!(source, error = %err, "config: ignoring invalid variant"),
    }
}

fn set_flag(settings: &mut Settings, source: &str, raw: &str) {
    match parse_flag(raw) {
        Some(flag) => settings.surface_load_errors = flag,
        None => warn!(source, value = raw, "config: ignoring invalid flag"),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Trims the base URL, defaults a missing scheme to `http://` and drops
/// trailing slashes. Only http and https are accepted.
pub fn normalize_base_url(raw_base_url: &str) -> anyhow::Result<String> {
    let raw_base_url = raw_base_url.trim();

    if raw_base_url.is_empty() {
        return Ok(DEFAULT_BASE_URL.to_string());
    }

    let with_scheme = if raw_base_url.contains("://") {
        raw_base_url.to_string()
    } else {
        format!("http://{raw_base_url}")
    };

    let scheme = with_scheme
        .split("://")
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    if scheme != "http" && scheme != "https" {
        bail!("unsupported backend url scheme '{scheme}' in '{raw_base_url}'");
    }

    Ok(with_scheme.trim_end_matches('/').to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
