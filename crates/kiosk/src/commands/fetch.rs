use kiosk_core::{DisplaySnapshot, Module};

use crate::cli::{GlobalOpts, SourceArgs};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let source = SourceArgs {
        file: None,
        occupancy: None,
    };
    let loaded = util::load(&source, global).await?;

    let out = output::render_single(
        &global.output,
        loaded.snapshot.as_ref(),
        summary,
        |s| format!("{}", s.occupancy),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn summary(snap: &DisplaySnapshot) -> String {
    let mut hourly = 0;
    let mut entry = 0;
    let mut info = 0;
    for module in snap.packages.iter().flat_map(|p| &p.modules) {
        match module {
            Module::HourlyPricing(_) => hourly += 1,
            Module::EntryPricing(_) => entry += 1,
            Module::PackageInfo(_) => info += 1,
        }
    }

    output::detail_block(&[
        ("Fetched", snap.fetched_at.to_rfc3339()),
        ("Occupancy", format!("{}%", snap.occupancy)),
        ("Packages", snap.packages.len().to_string()),
        ("Modules", format!("{hourly} hourly, {entry} entry, {info} info")),
        (
            "Layout",
            if snap.config.is_some() { "present" } else { "none" }.to_owned(),
        ),
    ])
}
