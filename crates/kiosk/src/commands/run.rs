//! `kiosk run`: the long-lived display loop.
//!
//! Fetches once, subscribes to the display topic and re-prints the
//! resolved templates after every snapshot change until Ctrl-C, or until
//! the sync client runs out of reconnect attempts.

use tracing::info;

use kiosk_core::{HeartBeat, Kiosk, SyncStatus};

use crate::cli::{GlobalOpts, OutputFormat, RunArgs};
use crate::commands::util;
use crate::config;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::resolve_kiosk_config(global)?;
    cfg.occupancy = util::occupancy_mode(args.occupancy, cfg.occupancy);
    if let Some(ms) = args.heartbeat_ms {
        cfg.heart_beat = HeartBeat::from_millis(ms, ms);
    }

    let transport = cfg.stomp_transport();
    let destination = cfg.topic().destination().to_owned();
    let kiosk = Kiosk::from_config(cfg)?;
    let color = output::should_color(&global.color);

    info!(destination = %destination, "starting display sync");
    kiosk.start(transport).await?;

    let mut versions = kiosk.subscribe();
    let mut status = kiosk.subscribe_status();
    print_update(&kiosk, &args.template, global, color);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let outcome = loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupted");
                break Ok(());
            }
            changed = versions.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                print_update(&kiosk, &args.template, global, color);
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let current: SyncStatus = *status.borrow_and_update();
                if !global.quiet {
                    eprintln!("broker: {}", output::paint_state(current.state, color));
                }
                if current.exhausted {
                    break Err(CliError::ReconnectExhausted {
                        attempts: current.attempt_count,
                    });
                }
            }
        }
    };

    kiosk.shutdown().await;
    outcome
}

/// Resolved templates, or a one-line summary when none were given.
fn print_update(kiosk: &Kiosk, templates: &[String], global: &GlobalOpts, color: bool) {
    let Some(snapshot) = kiosk.snapshot() else {
        return;
    };

    if templates.is_empty() {
        let line = format!(
            "v{}: {} package(s), occupancy {}%",
            snapshot.version,
            snapshot.packages.len(),
            snapshot.occupancy
        );
        output::print_output(&line, global.quiet);
        return;
    }

    let format = kiosk.text_formatter();
    let resolved: Vec<String> = templates.iter().map(|t| format(t)).collect();

    // One line per update so the stream stays parseable.
    let out = match global.output {
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
            serde_json::json!({ "version": snapshot.version, "resolved": resolved }).to_string()
        }
        OutputFormat::Table | OutputFormat::Plain => resolved
            .iter()
            .map(|r| output::paint_resolved(r, color))
            .collect::<Vec<_>>()
            .join("\n"),
    };
    output::print_output(&out, global.quiet);
}
