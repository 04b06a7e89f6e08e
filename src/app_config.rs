//! Application configuration loading for CLI defaults.
//!
//! Resolution order for every setting: CLI flag, then `OBPLATFORM_ENDPOINT`
//! (endpoint only), then the config file, then built-in defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use obplatform::ConnectorConfig;

/// Environment variable overriding the API endpoint.
pub const ENDPOINT_ENV_VAR: &str = "OBPLATFORM_ENDPOINT";

/// `key = value` file configuration for connector defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// API endpoint.
    pub endpoint: Option<String>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// HTTP read timeout in seconds.
    pub read_timeout_secs: Option<u64>,
    /// Delay between export status polls in milliseconds.
    pub poll_interval_ms: Option<u64>,
    /// Maximum number of pending polls before giving up.
    pub max_poll_attempts: Option<u32>,
    /// Show the progress bar for exports by default.
    pub show_progress: Option<bool>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    pub fn validate(&self) -> Result<()> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        if let Some(poll_interval_ms) = self.poll_interval_ms
            && poll_interval_ms > 300_000
        {
            bail!(
                "Invalid config value for `poll_interval_ms`: {poll_interval_ms}. Expected range: 0..=300000"
            );
        }
        if self.max_poll_attempts == Some(0) {
            bail!("Invalid config value for `max_poll_attempts`: 0. Expected at least 1");
        }
        if let Some(endpoint) = &self.endpoint
            && endpoint.trim().is_empty()
        {
            bail!("Invalid config value for `endpoint`: must not be empty");
        }
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

impl LoadedConfig {
    /// Whether configuration was read from disk.
    #[must_use]
    pub fn loaded_from_file(&self) -> bool {
        self.config.is_some()
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/obplatform/config.toml`
/// 2. `$HOME/.config/obplatform/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("obplatform")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("obplatform")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from an explicit path (must exist) or the default path (optional).
pub fn load_file_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = read_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config: Some(config),
        });
    }

    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(read_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

/// Settings after merging CLI, environment, file and defaults.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    /// Connector settings.
    pub connector: ConnectorConfig,
    /// Whether exports show a progress bar unless the CLI asks for one.
    pub show_progress: bool,
}

/// Merges the config sources into connector settings.
#[must_use]
pub fn resolve_effective_config(
    cli_endpoint: Option<&str>,
    env_endpoint: Option<String>,
    file: Option<&FileConfig>,
) -> EffectiveConfig {
    let mut connector = ConnectorConfig::default();
    let mut show_progress = false;

    if let Some(file) = file {
        if let Some(endpoint) = &file.endpoint {
            connector.endpoint.clone_from(endpoint);
        }
        if let Some(secs) = file.connect_timeout_secs {
            connector.connect_timeout_secs = secs;
        }
        if let Some(secs) = file.read_timeout_secs {
            connector.read_timeout_secs = secs;
        }
        if let Some(ms) = file.poll_interval_ms {
            connector.poll_interval = Duration::from_millis(ms);
        }
        if file.max_poll_attempts.is_some() {
            connector.max_poll_attempts = file.max_poll_attempts;
        }
        show_progress = file.show_progress.unwrap_or(false);
    }

    if let Some(endpoint) = env_endpoint.filter(|value| !value.trim().is_empty()) {
        connector.endpoint = endpoint;
    }
    if let Some(endpoint) = cli_endpoint {
        connector.endpoint = endpoint.to_string();
    }

    EffectiveConfig {
        connector,
        show_progress,
    }
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        let line_no = line_index + 1;

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();

        match key {
            "endpoint" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `endpoint` value on line {line_no}"))?;
                cfg.endpoint = Some(parsed);
            }
            "connect_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `connect_timeout_secs` value on line {line_no}")
                })?;
                cfg.connect_timeout_secs = Some(parsed);
            }
            "read_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `read_timeout_secs` value on line {line_no}")
                })?;
                cfg.read_timeout_secs = Some(parsed);
            }
            "poll_interval_ms" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `poll_interval_ms` value on line {line_no}")
                })?;
                cfg.poll_interval_ms = Some(parsed);
            }
            "max_poll_attempts" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `max_poll_attempts` value on line {line_no}")
                })?;
                let n = u32::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("max_poll_attempts out of range for u32"))?;
                cfg.max_poll_attempts = Some(n);
            }
            "show_progress" => {
                let parsed = parse_boolean(value)
                    .with_context(|| format!("Invalid `show_progress` value on line {line_no}"))?;
                cfg.show_progress = Some(parsed);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => bail!("Expected true or false, got '{other}'"),
    }
}
