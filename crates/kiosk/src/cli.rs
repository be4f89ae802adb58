//! Clap derive structures for the `kiosk` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use kiosk_config::Environment;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// kiosk -- drive and inspect parking kiosk displays
#[derive(Debug, Parser)]
#[command(
    name = "kiosk",
    version,
    about = "Keep parking kiosk displays in sync and preview their prices",
    long_about = "Fetches a kiosk's display (layout, pricing packages, occupancy),\n\
        follows the display topic over STOMP to re-fetch on change, and\n\
        resolves {package[..]} price tokens in display text.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Kiosk profile to use
    #[arg(long, short = 'p', env = "KIOSK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Display API base URL (overrides profile)
    #[arg(long, env = "KIOSK_API_URL", global = true)]
    pub api_url: Option<String>,

    /// STOMP-over-WebSocket broker URL (overrides profile)
    #[arg(long, env = "KIOSK_BROKER_URL", global = true)]
    pub broker_url: Option<String>,

    /// Display API key
    #[arg(long, env = "KIOSK_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Organization id
    #[arg(long, env = "KIOSK_ORG_ID", global = true)]
    pub org: Option<String>,

    /// Parking id
    #[arg(long, env = "KIOSK_PARKING_ID", global = true)]
    pub parking: Option<String>,

    /// Kiosk id (omit for parking-wide displays)
    #[arg(long, env = "KIOSK_KIOSK_ID", global = true)]
    pub kiosk: Option<String>,

    /// Deployment environment; development fills missing routing ids
    #[arg(long = "env", env = "KIOSK_ENV", value_parser = parse_environment, global = true)]
    pub environment: Option<Environment>,

    /// Output format
    #[arg(long, short = 'o', env = "KIOSK_OUTPUT", default_value = "table", global = true)]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Also write logs to this file (appended, non-blocking)
    #[arg(long, env = "KIOSK_LOG_FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "KIOSK_INSECURE", global = true)]
    pub insecure: bool,

    /// HTTP request timeout in seconds
    #[arg(long, env = "KIOSK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

fn parse_environment(raw: &str) -> Result<Environment, String> {
    raw.parse()
        .map_err(|_| format!("expected 'development' or 'production', got '{raw}'"))
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Follow the display topic and re-fetch on every notification
    Run(RunArgs),

    /// Fetch the display once and summarize it
    Fetch,

    /// Resolve price tokens in display text
    #[command(alias = "r")]
    Resolve(ResolveArgs),

    /// List every price the current display exposes
    Prices(PricesArgs),

    /// Print the STOMP destination for the configured kiosk
    Topic,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared source arguments ──────────────────────────────────────────

/// Where display data comes from and which occupancy prices use.
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Read a saved display response (JSON) instead of calling the API
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,

    /// Fixed occupancy percentage for dynamic prices (default: live)
    #[arg(long)]
    pub occupancy: Option<f64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  RUN
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Template to re-resolve and print after every update (repeatable)
    #[arg(long, short = 't')]
    pub template: Vec<String>,

    /// Fixed occupancy percentage for dynamic prices (default: live)
    #[arg(long)]
    pub occupancy: Option<f64>,

    /// Heart-beat interval in milliseconds, both directions
    #[arg(long)]
    pub heartbeat_ms: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  RESOLVE / PRICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Display text containing {package[..]} tokens
    #[arg(required = true)]
    pub templates: Vec<String>,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Args)]
pub struct PricesArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Language used for amounts
    #[arg(long, short = 'l', default_value = "en", value_parser = parse_language)]
    pub lang: kiosk_core::Language,
}

fn parse_language(raw: &str) -> Result<kiosk_core::Language, String> {
    raw.parse().map_err(|_| format!("expected 'fr' or 'en', got '{raw}'"))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a profile from the global flags (--org, --parking, ...)
    Init {
        /// Store --api-key in the system keyring instead of the file
        #[arg(long)]
        keyring: bool,
    },

    /// Show the effective configuration
    Show,

    /// Print the config file path
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Store an API key in the system keyring for the active profile
    SetKey {
        /// The API key
        key: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
