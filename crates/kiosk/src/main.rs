mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Held until exit so the file writer flushes.
    let guard = init_tracing(&cli.global);

    let result = run(cli).await;
    drop(guard);

    if let Err(err) = result {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// Stderr logging filtered by `-v` (or `RUST_LOG`), optionally JSON, plus
/// an optional non-blocking file sink for unattended screens.
fn init_tracing(global: &GlobalOpts) -> Option<WorkerGuard> {
    let level = match global.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let stderr = fmt::layer().with_writer(std::io::stderr).with_target(false);
    layers.push(if global.log_json {
        stderr.json().boxed()
    } else {
        stderr.boxed()
    });

    let guard = global.log_file.as_deref().map(|path| {
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let file = path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("kiosk.log"));
        let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file));
        let file_layer = fmt::layer().with_writer(writer).with_ansi(false);
        layers.push(if global.log_json {
            file_layer.json().boxed()
        } else {
            file_layer.boxed()
        });
        guard
    });

    tracing_subscriber::registry().with(layers).with(filter).init();
    guard
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "kiosk", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &cli.global).await
        }
    }
}
