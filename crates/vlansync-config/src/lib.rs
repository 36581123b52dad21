//! Configuration for vlansync.
//!
//! TOML or YAML config file, layered with `figment` (defaults → file →
//! `VLANSYNC_*` environment), credential resolution (env var, token file,
//! plaintext), and translation to `vlansync_core::SyncConfig`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml, Yaml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use vlansync_core::{
    CacheConfig, InventoryConfig, SourceConfig, SyncConfig, VlanId, VlanRef, VlanTranslations,
};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "VLANSYNC_CONFIG";
/// Prefix for environment overrides; nested keys split on `__`.
pub const ENV_PREFIX: &str = "VLANSYNC_";

const REDACTED: &str = "********";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API token configured for {target}")]
    NoCredentials { target: String },

    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── Config structs ──────────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub netbox: NetBoxSection,

    #[serde(default)]
    pub runtime: RuntimeSection,

    /// Raw FortiGate VLAN name → vid (or a `vlanNN`-style name).
    #[serde(default)]
    pub vlan_translations: BTreeMap<String, TranslationTarget>,

    #[serde(default)]
    pub fortigates: Vec<FortiGateSection>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetBoxSection {
    /// Base URL, e.g. `https://netbox.example.com`.
    pub url: Option<String>,

    /// API token (plaintext — prefer `api_token_file` or `api_token_env`).
    pub api_token: Option<String>,

    /// File containing the API token.
    pub api_token_file: Option<PathBuf>,

    /// Environment variable containing the API token.
    pub api_token_env: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_netbox_timeout")]
    pub timeout: u64,

    #[serde(default = "default_true")]
    pub verify_ssl: bool,

    /// Retries for transient failures (timeouts, 429/502/503/504).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for NetBoxSection {
    fn default() -> Self {
        Self {
            url: None,
            api_token: None,
            api_token_file: None,
            api_token_env: None,
            timeout: default_netbox_timeout(),
            verify_ssl: true,
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuntimeSection {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Also write a timestamped log file into this directory.
    pub log_dir: Option<PathBuf>,

    /// Response cache directory. Unset disables caching.
    pub cache_dir: Option<PathBuf>,

    /// Serve FortiGate/NetBox reads from the cache when available.
    #[serde(default)]
    pub use_cached_data: bool,

    /// Run in single-switch mode against this switch.
    pub test_switch: Option<String>,

    /// NetBox writes allowed per run in single-switch mode.
    #[serde(default = "default_max_updates")]
    pub max_updates: u32,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_dir: None,
            cache_dir: None,
            use_cached_data: false,
            test_switch: None,
            max_updates: default_max_updates(),
        }
    }
}

/// A FortiGate to read managed switches from.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FortiGateSection {
    pub name: String,

    /// Hostname, IP, or full `https://` URL.
    pub host: String,

    pub api_token: Option<String>,
    pub api_token_file: Option<PathBuf>,
    pub api_token_env: Option<String>,

    #[serde(default = "default_true")]
    pub verify_ssl: bool,

    pub vdom: Option<String>,

    #[serde(default = "default_fortigate_timeout")]
    pub timeout: u64,
}

/// Right-hand side of a `vlan_translations` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TranslationTarget {
    Vid(i64),
    Name(String),
}

fn default_true() -> bool {
    true
}
fn default_netbox_timeout() -> u64 {
    120
}
fn default_fortigate_timeout() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_log_level() -> String {
    "info".into()
}
fn default_max_updates() -> u32 {
    1
}

// ── Config file path ────────────────────────────────────────────────

/// Platform default config file path.
pub fn default_config_path() -> PathBuf {
    ProjectDirs::from("com", "vlansync", "vlansync").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("vlansync");
    p
}

/// Where the config file comes from, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Flag(PathBuf),
    Env(PathBuf),
    Default(PathBuf),
}

impl ConfigSource {
    /// `--config`, then `VLANSYNC_CONFIG`, then the platform default.
    pub fn resolve(explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            return Self::Flag(path.to_path_buf());
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::Env(PathBuf::from(path)),
            _ => Self::Default(default_config_path()),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Flag(p) | Self::Env(p) | Self::Default(p) => p,
        }
    }

    /// Explicitly named files must exist; the default one may not.
    fn is_required(&self) -> bool {
        !matches!(self, Self::Default(_))
    }
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the layered config: defaults → file → environment.
pub fn load_config(source: &ConfigSource) -> Result<Config, ConfigError> {
    let path = source.path();
    if source.is_required() && !path.is_file() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let figment = Figment::new().merge(Serialized::defaults(Config::default()));
    let figment = if is_yaml(path) {
        figment.merge(Yaml::file(path))
    } else {
        figment.merge(Toml::file(path))
    };
    let figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]).split("__"));

    Ok(figment.extract()?)
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

// ── Normalization ───────────────────────────────────────────────────

/// Trim, drop trailing slashes, collapse `https:///host` into
/// `https://host`, and require a host.
pub fn normalize_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut value = raw.trim().trim_end_matches('/').to_owned();
    for scheme in ["https", "http"] {
        let prefix = format!("{scheme}://");
        if let Some(rest) = value.strip_prefix(&prefix) {
            value = format!("{prefix}{}", rest.trim_start_matches('/'));
            break;
        }
    }

    let url = Url::parse(&value).map_err(|e| invalid(field, format!("{raw:?}: {e}")))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid(
            field,
            format!("{raw:?} has no host (use e.g. https://netbox.example.com)"),
        ));
    }
    Ok(url)
}

/// A FortiGate `host` may be bare; default the scheme to https.
fn fortigate_url(field: &str, host: &str) -> Result<Url, ConfigError> {
    let host = host.trim();
    if host.contains("://") {
        normalize_url(field, host)
    } else {
        normalize_url(field, &format!("https://{host}"))
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a token: named env var, then token file, then plaintext.
pub fn resolve_token(
    target: &str,
    api_token: Option<&str>,
    api_token_file: Option<&Path>,
    api_token_env: Option<&str>,
) -> Result<SecretString, ConfigError> {
    // 1. Env var named in config
    if let Some(name) = api_token_env {
        if let Ok(value) = std::env::var(name) {
            if !value.trim().is_empty() {
                return Ok(SecretString::from(value.trim().to_owned()));
            }
        }
    }

    // 2. Token file
    if let Some(path) = api_token_file {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            invalid(
                format!("{target}.api_token_file"),
                format!("{}: {e}", path.display()),
            )
        })?;
        let token = contents.trim();
        if !token.is_empty() {
            return Ok(SecretString::from(token.to_owned()));
        }
    }

    // 3. Plaintext in config
    if let Some(token) = api_token.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(SecretString::from(token.to_owned()));
    }

    Err(ConfigError::NoCredentials {
        target: target.into(),
    })
}

// ── Translation to core config ──────────────────────────────────────

impl Config {
    /// Validate and resolve into the runtime config the engine consumes.
    pub fn to_sync_config(&self) -> Result<SyncConfig, ConfigError> {
        let netbox = self.netbox_config()?;
        let fortigates = self.fortigate_configs()?;
        let translations = self.translations()?;

        Ok(SyncConfig {
            netbox,
            fortigates,
            translations,
            cache: CacheConfig {
                dir: self.runtime.cache_dir.clone(),
                use_cached_data: self.runtime.use_cached_data,
            },
            max_updates: self.runtime.max_updates,
        })
    }

    /// `runtime.test_switch`, ignoring blanks.
    pub fn test_switch(&self) -> Option<&str> {
        self.runtime
            .test_switch
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn netbox_config(&self) -> Result<InventoryConfig, ConfigError> {
        let nb = &self.netbox;
        let raw_url = nb
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| invalid("netbox.url", "is required"))?;
        if nb.timeout == 0 {
            return Err(invalid("netbox.timeout", "must be at least 1 second"));
        }

        Ok(InventoryConfig {
            url: normalize_url("netbox.url", raw_url)?,
            token: resolve_token(
                "netbox",
                nb.api_token.as_deref(),
                nb.api_token_file.as_deref(),
                nb.api_token_env.as_deref(),
            )?,
            timeout: Duration::from_secs(nb.timeout),
            verify_ssl: nb.verify_ssl,
            max_retries: nb.max_retries,
        })
    }

    fn fortigate_configs(&self) -> Result<Vec<SourceConfig>, ConfigError> {
        if self.fortigates.is_empty() {
            return Err(invalid("fortigates", "must be a non-empty list"));
        }

        self.fortigates
            .iter()
            .enumerate()
            .map(|(i, fg)| {
                let name = fg.name.trim();
                if name.is_empty() {
                    return Err(invalid(format!("fortigates[{i}].name"), "must not be empty"));
                }
                if fg.host.trim().is_empty() {
                    return Err(invalid(format!("fortigates[{i}].host"), "must not be empty"));
                }
                Ok(SourceConfig {
                    name: name.to_owned(),
                    url: fortigate_url(&format!("fortigates[{i}].host"), &fg.host)?,
                    token: resolve_token(
                        &format!("FortiGate '{name}'"),
                        fg.api_token.as_deref(),
                        fg.api_token_file.as_deref(),
                        fg.api_token_env.as_deref(),
                    )?,
                    verify_ssl: fg.verify_ssl,
                    vdom: fg.vdom.clone().filter(|v| !v.trim().is_empty()),
                    timeout: Duration::from_secs(fg.timeout.max(1)),
                })
            })
            .collect()
    }

    fn translations(&self) -> Result<VlanTranslations, ConfigError> {
        self.vlan_translations
            .iter()
            .map(|(raw, target)| {
                let field = || format!("vlan_translations.{raw}");
                let vid = match target {
                    TranslationTarget::Vid(v) => VlanId::new(*v),
                    TranslationTarget::Name(name) => vlansync_core::model::normalize(
                        &VlanRef::Name(name.clone()),
                    )
                    .and_then(|identity| identity.vid()),
                }
                .ok_or_else(|| invalid(field(), "must be a VLAN id in 1..=4094"))?;
                Ok((raw.clone(), vid))
            })
            .collect()
    }

    /// Copy with every plaintext token replaced by a placeholder.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.netbox.api_token.is_some() {
            copy.netbox.api_token = Some(REDACTED.into());
        }
        for fg in &mut copy.fortigates {
            if fg.api_token.is_some() {
                fg.api_token = Some(REDACTED.into());
            }
        }
        copy
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
