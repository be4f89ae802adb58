use serde::Serialize;
use tabled::Tabled;

use kiosk_core::{
    Language, Module, Pricing, PricingPackage, format_cad, format_duration, resolve_amount,
};

use crate::cli::{GlobalOpts, PricesArgs};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

/// One addressable price of the display.
#[derive(Debug, Serialize, Tabled)]
struct PriceRow {
    #[tabled(rename = "Package")]
    package: usize,
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Pricing")]
    pricing: &'static str,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Token")]
    token: String,
}

pub async fn handle(args: PricesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let loaded = util::load(&args.source, global).await?;
    let rows = price_rows(&loaded.snapshot.packages, loaded.occupancy(), args.lang);

    let out = output::render_list(
        &global.output,
        &rows,
        |r| PriceRow {
            package: r.package,
            kind: r.kind,
            id: r.id.clone(),
            duration: r.duration.clone(),
            pricing: r.pricing,
            amount: r.amount.clone(),
            token: r.token.clone(),
        },
        |r| format!("{}\t{}", r.token, r.amount),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn pricing_kind(pricing: &Pricing) -> &'static str {
    match pricing {
        Pricing::Static(_) => "static",
        Pricing::Dynamic(_) => "dynamic",
    }
}

fn price_rows(packages: &[PricingPackage], occupancy: f64, lang: Language) -> Vec<PriceRow> {
    let mut rows = Vec::new();
    let code = lang.code();

    for (index, package) in packages.iter().enumerate() {
        let package_id = index + 1;
        for module in &package.modules {
            match module {
                Module::HourlyPricing(hourly) => {
                    for (kind, segment, items) in [
                        ("maximum", "maximums", &hourly.maximums),
                        ("unit", "units", &hourly.units),
                    ] {
                        rows.extend(items.iter().map(|item| PriceRow {
                            package: package_id,
                            kind,
                            id: item.id.clone(),
                            duration: format_duration(item.minutes),
                            pricing: pricing_kind(&item.pricing),
                            amount: format_cad(resolve_amount(occupancy, &item.pricing), lang),
                            token: format!("{{package[{package_id}].{segment}[{}].pricing.{code}}}", item.id),
                        }));
                    }
                }
                Module::EntryPricing(entry) => {
                    rows.extend(entry.rows.iter().map(|row| PriceRow {
                        package: package_id,
                        kind: "entry",
                        id: row.id.clone(),
                        duration: "-".into(),
                        pricing: pricing_kind(&row.pricing),
                        amount: format_cad(resolve_amount(occupancy, &row.pricing), lang),
                        token: format!("{{package[{package_id}].entry[{}].pricing.{code}}}", row.id),
                    }));
                }
                Module::PackageInfo(_) => {}
            }
        }
    }
    rows
}
