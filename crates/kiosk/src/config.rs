//! CLI configuration: thin layer over `kiosk_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--api-url, --org, --api-key, ...). Flags win over the profile, the
//! profile wins over built-in defaults.

use secrecy::SecretString;

use kiosk_config::{Config, Environment, Profile};
use kiosk_core::{KioskConfig, KioskRoute, Topic};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use kiosk_config::{config_path, load_config, save_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// The active profile with every flag override applied.
///
/// A profile named explicitly with `--profile` must exist; otherwise a
/// missing profile is treated as empty so flags and env vars alone work.
pub fn effective_profile(global: &GlobalOpts, config: &Config) -> Result<(String, Profile), CliError> {
    let name = active_profile_name(global, config);
    let mut profile = match config.profiles.get(&name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            let mut available: Vec<_> = config.profiles.keys().cloned().collect();
            available.sort();
            return Err(CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        None => Profile::default(),
    };
    apply_overrides(&mut profile, global);
    Ok((name, profile))
}

/// Copy every flag the operator passed onto `profile`.
pub fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    override_opt(&mut profile.api_url, global.api_url.as_ref());
    override_opt(&mut profile.broker_url, global.broker_url.as_ref());
    override_opt(&mut profile.org_id, global.org.as_ref());
    override_opt(&mut profile.parking_id, global.parking.as_ref());
    override_opt(&mut profile.kiosk_id, global.kiosk.as_ref());
    if let Some(env) = global.environment {
        profile.environment = Some(env);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(secs) = global.timeout {
        profile.timeout = Some(secs);
    }
}

fn override_opt(slot: &mut Option<String>, flag: Option<&String>) {
    if let Some(value) = flag {
        *slot = Some(value.clone());
    }
}

fn environment(profile: &Profile, config: &Config) -> Environment {
    profile.environment.unwrap_or(config.defaults.environment)
}

/// Routing ids only; needs no credentials.
pub fn resolve_route(global: &GlobalOpts) -> Result<(KioskRoute, Profile), CliError> {
    let config = load_config()?;
    let (name, profile) = effective_profile(global, &config)?;
    let route = kiosk_config::resolve_route(&profile, &name, environment(&profile, &config))?;
    Ok((route, profile))
}

/// STOMP destination of the configured kiosk.
pub fn resolve_topic(global: &GlobalOpts) -> Result<Topic, CliError> {
    let (route, profile) = resolve_route(global)?;
    let prefix = profile
        .topic_prefix
        .as_deref()
        .unwrap_or(kiosk_core::sync::DEFAULT_TOPIC_PREFIX);
    Ok(Topic::new(&route, prefix))
}

/// Translate the active profile + global flags into a `KioskConfig`.
pub fn resolve_kiosk_config(global: &GlobalOpts) -> Result<KioskConfig, CliError> {
    let config = load_config()?;
    let (name, profile) = effective_profile(global, &config)?;

    // --api-key beats every other credential source.
    let api_key = match global.api_key {
        Some(ref key) => SecretString::from(key.clone()),
        None => kiosk_config::resolve_api_key(&profile, &name)?,
    };

    Ok(kiosk_config::kiosk_config_with_key(&profile, &name, &config.defaults, api_key)?)
}
