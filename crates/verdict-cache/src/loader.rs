use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::config::CacheConfig;
use crate::errors::ConfigError;

const ENV_PREFIX: &str = "VERDICT_CACHE__";

#[derive(Debug, Default)]
pub struct LoadOptions {
    pub paths: Vec<PathBuf>,
    pub include_env: bool,
}

impl LoadOptions {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            paths: vec![path.into()],
            include_env: true,
        }
    }
}

/// Defaults, then `path` when it exists, then `VERDICT_CACHE__*` variables.
pub fn load_config(path: Option<&Path>) -> Result<CacheConfig, ConfigError> {
    let mut options = LoadOptions {
        include_env: true,
        ..LoadOptions::default()
    };
    if let Some(p) = path {
        options.paths.push(p.to_path_buf());
    }
    load_config_with_options(&options)
}

pub fn load_config_with_options(options: &LoadOptions) -> Result<CacheConfig, ConfigError> {
    let mut merged = match serde_json::to_value(CacheConfig::default()) {
        Ok(Value::Object(map)) => map,
        Ok(_) => Map::new(),
        Err(err) => return Err(ConfigError::invalid("defaults", &err.to_string())),
    };

    for path in &options.paths {
        if path.exists() {
            let overlay = overlay_from_file(path)?;
            debug!(target: "verdict::cache", path = %path.display(), keys = overlay.len(), "applying config file");
            merged.extend(overlay);
        }
    }

    if options.include_env {
        merged.extend(overlay_from_env());
    }

    let config: CacheConfig = serde_json::from_value(Value::Object(merged))
        .map_err(|err| ConfigError::invalid("config", &err.to_string()))?;
    config.validate()?;
    Ok(config)
}

fn overlay_from_file(path: &Path) -> Result<Map<String, Value>, ConfigError> {
    let content = fs::read_to_string(path)
        .map_err(|err| ConfigError::source_unavailable("read", &format!("{}: {err}", path.display())))?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let value: Value = match extension.as_str() {
        "yaml" | "yml" => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
                .map_err(|err| ConfigError::invalid("file", &err.to_string()))?;
            serde_json::to_value(yaml).map_err(|err| ConfigError::invalid("file", &err.to_string()))?
        }
        "toml" => {
            let table: toml::Value = toml::from_str(&content)
                .map_err(|err| ConfigError::invalid("file", &err.to_string()))?;
            serde_json::to_value(table).map_err(|err| ConfigError::invalid("file", &err.to_string()))?
        }
        "json" => serde_json::from_str(&content)
            .map_err(|err| ConfigError::invalid("file", &err.to_string()))?,
        other => {
            return Err(ConfigError::invalid(
                "file",
                &format!("unsupported config extension `{other}`"),
            ))
        }
    };
    match value {
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(key, value)| (key.trim().to_ascii_lowercase(), value))
            .collect()),
        Value::Null => Ok(Map::new()),
        _ => Err(ConfigError::invalid("file", "top level must be a mapping")),
    }
}

fn overlay_from_env() -> Map<String, Value> {
    let mut overlay = Map::new();
    for (key, raw) in env::vars() {
        if let Some(field) = key.strip_prefix(ENV_PREFIX) {
            let field = field.trim_matches('_').to_ascii_lowercase();
            if field.is_empty() {
                continue;
            }
            overlay.insert(field, parse_env_value(&raw));
        }
    }
    overlay
}

fn parse_env_value(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
        return parsed;
    }
    if let Ok(boolean) = raw.parse::<bool>() {
        return Value::Bool(boolean);
    }
    if let Ok(int_val) = raw.parse::<i64>() {
        return Value::Number(int_val.into());
    }
    Value::String(raw.to_string())
}
