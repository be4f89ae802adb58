//! Config subcommand handlers.

use serde::Serialize;
use tabled::Tabled;

use kiosk_config::{ConfigError, Environment};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, active_profile_name, apply_overrides};
use crate::error::CliError;
use crate::output;

const MASK: &str = "********";

#[derive(Debug, Serialize, Tabled)]
struct ProfileRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Profile")]
    name: String,
    #[tabled(rename = "Environment")]
    environment: String,
    #[tabled(rename = "Organization")]
    org: String,
    #[tabled(rename = "Parking")]
    parking: String,
    #[tabled(rename = "Kiosk")]
    kiosk: String,
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init { keyring } => init(global, keyring),
        ConfigCommand::Show => show(global),
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
        ConfigCommand::Profiles => profiles(global),
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                return Err(ConfigError::UnknownProfile { name }.into());
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("default profile: {name}");
            }
            Ok(())
        }
        ConfigCommand::SetKey { key } => {
            let cfg = config::load_config()?;
            let name = active_profile_name(global, &cfg);
            kiosk_config::store_api_key(&name, &key)?;
            if !global.quiet {
                eprintln!("API key for '{name}' stored in the system keyring");
            }
            Ok(())
        }
    }
}

/// Write (or update) the active profile from the global flags.
fn init(global: &GlobalOpts, use_keyring: bool) -> Result<(), CliError> {
    let mut cfg = config::load_config()?;
    let name = active_profile_name(global, &cfg);

    let mut profile = cfg.profiles.get(&name).cloned().unwrap_or_default();
    apply_overrides(&mut profile, global);

    let env = profile.environment.unwrap_or(cfg.defaults.environment);
    kiosk_config::resolve_route(&profile, &name, env)?;

    if let Some(ref key) = global.api_key {
        if use_keyring {
            kiosk_config::store_api_key(&name, key)?;
            profile.api_key = None;
        } else {
            profile.api_key = Some(key.clone());
        }
    }
    if env == Environment::Development && profile.environment.is_none() {
        profile.environment = Some(Environment::Development);
    }

    if cfg.profiles.is_empty() {
        cfg.default_profile = Some(name.clone());
    }
    cfg.profiles.insert(name.clone(), profile);

    let path = config::config_path();
    config::save_config(&cfg)?;
    if !global.quiet {
        eprintln!("profile '{name}' written to {}", path.display());
    }
    Ok(())
}

fn show(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config()?;
    for profile in cfg.profiles.values_mut() {
        if profile.api_key.is_some() {
            profile.api_key = Some(MASK.into());
        }
        if profile.broker_passcode.is_some() {
            profile.broker_passcode = Some(MASK.into());
        }
    }

    let out = match global.output {
        OutputFormat::Json => serde_json::to_string_pretty(&cfg)?,
        OutputFormat::JsonCompact => serde_json::to_string(&cfg)?,
        OutputFormat::Yaml => serde_yaml::to_string(&cfg)?,
        OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(&cfg).map_err(ConfigError::from)?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

fn profiles(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config()?;
    let default = active_profile_name(global, &cfg);

    let mut rows: Vec<ProfileRow> = cfg
        .profiles
        .iter()
        .map(|(name, p)| ProfileRow {
            marker: if *name == default { "*" } else { "" },
            name: name.clone(),
            environment: p.environment.unwrap_or(cfg.defaults.environment).to_string(),
            org: p.org_id.clone().unwrap_or_default(),
            parking: p.parking_id.clone().unwrap_or_default(),
            kiosk: p.kiosk_id.clone().unwrap_or_default(),
        })
        .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));

    let out = output::render_list(
        &global.output,
        &rows,
        |r| ProfileRow {
            marker: r.marker,
            name: r.name.clone(),
            environment: r.environment.clone(),
            org: r.org.clone(),
            parking: r.parking.clone(),
            kiosk: r.kiosk.clone(),
        },
        |r| r.name.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
