//! Configuration for kiosk displays.
//!
//! TOML profiles, `KIOSK_` environment overrides, credential resolution
//! (env + keyring + plaintext), and translation to
//! `kiosk_core::KioskConfig`. The binary layers its flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use kiosk_core::{
    BrokerCredentials, HeartBeat, KioskConfig, KioskRoute, OccupancyMode, ReconnectPolicy, TlsMode,
};

/// Keyring service name; entries are `{profile}/api-key`.
pub const KEYRING_SERVICE: &str = "kiosk-display";

/// Environment variable consulted for the API key when a profile names none.
pub const API_KEY_ENV: &str = "KIOSK_API_KEY";

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "KIOSK_CONFIG";

const DEFAULT_API_URL: &str = "https://www.parkwizeinc.com";
const DEFAULT_BROKER_URL: &str = "wss://api.parkwizeinc.com/ws";

// Routing used by development kiosks when none is configured.
const DEV_ORG_ID: &str = "0b22a7d7-08f6-4ae8-804c-7b58c0def7c5";
const DEV_PARKING_ID: &str = "36201249-9e37-4888-887f-d3ebb30d8d38";
const DEV_KIOSK_ID: &str = "127";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("missing {field} for profile '{profile}'")]
    MissingField { field: String, profile: String },

    #[error("no API key configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

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

// ── TOML config structs ─────────────────────────────────────────────

/// Deployment environment of a kiosk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Environment {
    /// Missing routing ids fall back to the development kiosk.
    Development,
    /// Organization and parking ids are mandatory.
    #[default]
    Production,
}

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named kiosk profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Pick a profile: the explicit name, else `default_profile`, else "default".
    pub fn profile(&self, name: Option<&str>) -> Result<(String, &Profile), ConfigError> {
        let name = name
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into());
        let profile = self
            .profiles
            .get(&name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.clone() })?;
        Ok((name, profile))
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub environment: Environment,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            environment: Environment::default(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named kiosk profile.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Display API base URL.
    pub api_url: Option<String>,

    /// STOMP-over-WebSocket broker URL.
    pub broker_url: Option<String>,

    /// Virtual host sent on `CONNECT`.
    pub broker_host: Option<String>,

    /// Broker login, when the broker wants one.
    pub broker_login: Option<String>,

    /// Broker passcode (plaintext).
    pub broker_passcode: Option<String>,

    pub org_id: Option<String>,
    pub parking_id: Option<String>,
    pub kiosk_id: Option<String>,

    /// Overrides `defaults.environment`.
    pub environment: Option<Environment>,

    /// API key (plaintext; prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Accept invalid TLS certificates.
    pub insecure: Option<bool>,

    /// HTTP timeout in seconds.
    pub timeout: Option<u64>,

    /// Fixed occupancy percentage for dynamic prices; absent = live.
    pub occupancy: Option<f64>,

    /// Destination prefix in front of `displays/...`.
    pub topic_prefix: Option<String>,

    /// Heart-beat interval offered to the broker, both directions (ms).
    pub heartbeat_ms: Option<u64>,

    /// STOMP handshake timeout in seconds.
    pub handshake_timeout: Option<u64>,

    /// Reconnects scheduled before giving up.
    pub max_reconnect_attempts: Option<u32>,

    /// First reconnect delay (ms).
    pub reconnect_delay_ms: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `$KIOSK_CONFIG`, else platform conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "kiosk", "kiosk-display").map_or_else(
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
    p.push("kiosk-display");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path` (missing file is fine) + `KIOSK_` environment.
///
/// Nested keys use a double underscore: `KIOSK_DEFAULTS__TIMEOUT=10`,
/// `KIOSK_PROFILES__LOBBY__KIOSK_ID=12`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("KIOSK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it can't be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Serialize config to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the display API key.
///
/// Order: the profile's `api_key_env`, `$KIOSK_API_KEY`, the system
/// keyring, then plaintext `api_key`.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Ok(val) = std::env::var(API_KEY_ENV) {
        if !val.is_empty() {
            return Ok(SecretString::from(val));
        }
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/api-key")) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    if let Some(ref key) = profile.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store an API key in the system keyring for `profile_name`.
pub fn store_api_key(profile_name: &str, key: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/api-key"))
        .and_then(|entry| entry.set_password(key))
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })
}

/// Routing ids for `env`.
///
/// Development fills gaps with the development kiosk. Production needs
/// organization and parking; the kiosk id stays optional (parking-wide
/// displays).
pub fn resolve_route(profile: &Profile, profile_name: &str, env: Environment) -> Result<KioskRoute, ConfigError> {
    let present = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned);
    let org = present(&profile.org_id);
    let parking = present(&profile.parking_id);
    let kiosk = present(&profile.kiosk_id);

    match env {
        Environment::Development => Ok(KioskRoute::new(
            org.unwrap_or_else(|| DEV_ORG_ID.into()),
            parking.unwrap_or_else(|| DEV_PARKING_ID.into()),
            Some(kiosk.unwrap_or_else(|| DEV_KIOSK_ID.into())),
        )),
        Environment::Production => {
            let missing = |field: &str| ConfigError::MissingField {
                field: field.into(),
                profile: profile_name.into(),
            };
            let org = org.ok_or_else(|| missing("org_id"))?;
            let parking = parking.ok_or_else(|| missing("parking_id"))?;
            Ok(KioskRoute::new(org, parking, kiosk))
        }
    }
}

fn parse_url(field: &str, raw: Option<&str>, default: &str) -> Result<url::Url, ConfigError> {
    let raw = raw.unwrap_or(default);
    raw.parse().map_err(|_| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// Build a `KioskConfig` from a profile, no CLI flag overrides.
pub fn profile_to_kiosk_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<KioskConfig, ConfigError> {
    let api_key = resolve_api_key(profile, profile_name)?;
    kiosk_config_with_key(profile, profile_name, defaults, api_key)
}

/// Like [`profile_to_kiosk_config`], with the API key already resolved.
pub fn kiosk_config_with_key(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    api_key: SecretString,
) -> Result<KioskConfig, ConfigError> {
    let api_url = parse_url("api_url", profile.api_url.as_deref(), DEFAULT_API_URL)?;
    let broker_url = parse_url("broker_url", profile.broker_url.as_deref(), DEFAULT_BROKER_URL)?;
    if !matches!(broker_url.scheme(), "ws" | "wss") {
        return Err(ConfigError::Validation {
            field: "broker_url".into(),
            reason: format!("expected ws:// or wss://, got {broker_url}"),
        });
    }

    let env = profile.environment.unwrap_or(defaults.environment);
    let route = resolve_route(profile, profile_name, env)?;

    let mut cfg = KioskConfig::new(api_url, api_key, broker_url, route);

    cfg.broker_host.clone_from(&profile.broker_host);
    if let Some(ref login) = profile.broker_login {
        cfg.broker_credentials = Some(BrokerCredentials {
            login: login.clone(),
            passcode: SecretString::from(profile.broker_passcode.clone().unwrap_or_default()),
        });
    }

    cfg.tls = if profile.insecure.unwrap_or(false) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };
    cfg.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    if let Some(value) = profile.occupancy {
        cfg.occupancy = OccupancyMode::Fixed(value);
    }
    if let Some(ref prefix) = profile.topic_prefix {
        cfg.topic_prefix.clone_from(prefix);
    }
    if let Some(ms) = profile.heartbeat_ms {
        cfg.heart_beat = HeartBeat::from_millis(ms, ms);
    }
    if let Some(secs) = profile.handshake_timeout {
        cfg.handshake_timeout = Duration::from_secs(secs);
    }

    let mut reconnect = ReconnectPolicy::default();
    if let Some(max) = profile.max_reconnect_attempts {
        reconnect.max_attempts = max;
    }
    if let Some(ms) = profile.reconnect_delay_ms {
        reconnect.base_delay = Duration::from_millis(ms);
    }
    cfg.reconnect = reconnect;

    Ok(cfg)
}
