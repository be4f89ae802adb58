use serde::Serialize;
use tabled::Tabled;

use kiosk_core::resolve;

use crate::cli::{GlobalOpts, ResolveArgs};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct Resolved {
    template: String,
    resolved: String,
    occupancy: f64,
}

#[derive(Tabled)]
struct ResolvedRow {
    #[tabled(rename = "Template")]
    template: String,
    #[tabled(rename = "Resolved")]
    resolved: String,
}

pub async fn handle(args: ResolveArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let loaded = util::load(&args.source, global).await?;
    let occupancy = loaded.occupancy();
    let color = output::should_color(&global.color);

    let results: Vec<Resolved> = args
        .templates
        .into_iter()
        .map(|template| {
            let resolved = resolve(&template, &loaded.snapshot.packages, occupancy);
            Resolved {
                template,
                resolved,
                occupancy,
            }
        })
        .collect();

    let out = output::render_list(
        &global.output,
        &results,
        |r| ResolvedRow {
            template: r.template.clone(),
            resolved: output::paint_resolved(&r.resolved, color),
        },
        |r| r.resolved.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
