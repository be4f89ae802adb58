//! Price-token resolver.
//!
//! Display templates carry `{package[P]...}` placeholders. [`resolve`]
//! substitutes every recognized token from the current pricing packages
//! and falls back to [`SENTINEL`] whenever anything package-shaped is left
//! over, so a screen never shows half-filled prices.
//!
//! Token grammar (`P` = 1-based package position, `L` = `fr` | `en`):
//!
//! | token                                        | value                         |
//! |----------------------------------------------|-------------------------------|
//! | `{package[P].maximums[M].pricing.L}`         | currency                      |
//! | `{package[P].maximums[M].pricing-short.L}`   | abbreviated currency          |
//! | `{package[P].maximums[M].minutes}`           | duration label                |
//! | `{package[P].units[U].pricing.L}`            | currency                      |
//! | `{package[P].units[U].minutes}`              | duration label                |
//! | `{package[P].entry[R].pricing.L}`            | currency                      |
//! | `{package[P].entry[R].pricing-short.L}`      | abbreviated currency          |
//! | `{package[P].info.title.L}` (`line1`, `line2`) | raw text                    |
//!
//! Maximums and units are addressable by raw id *or* by their duration
//! label: `maximums[1]` and `maximums[30m]` name the same item.

use strum::IntoEnumIterator;
use tracing::trace;

use crate::calculator::resolve_amount;
use crate::format::{format_cad, format_cad_short, format_duration};
use crate::model::{HourlyPricing, Language, Module, PackageInfo, PricingPackage, TimedPrice};

/// Shown instead of any text whose price tokens could not all be filled.
pub const SENTINEL: &str = "=====";

/// Every token contains this; its presence after substitution means a miss.
const TOKEN_MARKER: &str = "package";

/// Resolve all price tokens in `template`.
///
/// `occupancy` feeds dynamic ladders. Pure apart from trace logging.
pub fn resolve(template: &str, packages: &[PricingPackage], occupancy: f64) -> String {
    if !template.contains(TOKEN_MARKER) {
        return template.to_owned();
    }
    if packages.is_empty() {
        trace!(template, "no pricing loaded");
        return SENTINEL.to_owned();
    }

    let mut text = template.to_owned();
    for (index, package) in packages.iter().enumerate() {
        let subst = Substitution {
            package_id: index + 1,
            occupancy,
        };
        for module in &package.modules {
            for lang in Language::iter() {
                subst.apply(&mut text, module, lang);
            }
        }
    }

    if text.contains(TOKEN_MARKER) {
        trace!(template, partial = %text, "unresolved price token");
        return SENTINEL.to_owned();
    }
    text
}

/// Substitution context for one package.
struct Substitution {
    package_id: usize,
    occupancy: f64,
}

impl Substitution {
    fn apply(&self, text: &mut String, module: &Module, lang: Language) {
        match module {
            Module::HourlyPricing(hourly) => self.hourly(text, hourly, lang),
            Module::EntryPricing(entry) => {
                for row in &entry.rows {
                    let amount = resolve_amount(self.occupancy, &row.pricing);
                    let base = self.item_path("entry", &row.id);
                    replace_token(text, &format!("{{{base}.pricing.{lang}}}"), || format_cad(amount, lang));
                    replace_token(text, &format!("{{{base}.pricing-short.{lang}}}"), || {
                        format_cad_short(amount, lang)
                    });
                }
            }
            Module::PackageInfo(info) => self.info(text, info, lang),
        }
    }

    fn hourly(&self, text: &mut String, hourly: &HourlyPricing, lang: Language) {
        for max in &hourly.maximums {
            let amount = resolve_amount(self.occupancy, &max.pricing);
            for base in self.timed_paths("maximums", max) {
                replace_token(text, &format!("{{{base}.pricing.{lang}}}"), || format_cad(amount, lang));
                replace_token(text, &format!("{{{base}.pricing-short.{lang}}}"), || {
                    format_cad_short(amount, lang)
                });
                replace_token(text, &format!("{{{base}.minutes}}"), || format_duration(max.minutes));
            }
        }
        for unit in &hourly.units {
            let amount = resolve_amount(self.occupancy, &unit.pricing);
            for base in self.timed_paths("units", unit) {
                replace_token(text, &format!("{{{base}.pricing.{lang}}}"), || format_cad(amount, lang));
                replace_token(text, &format!("{{{base}.minutes}}"), || format_duration(unit.minutes));
            }
        }
    }

    fn info(&self, text: &mut String, info: &PackageInfo, lang: Language) {
        let fields = [
            ("title", info.title(lang)),
            ("line1", info.line1(lang)),
            ("line2", info.line2(lang)),
        ];
        for (field, value) in fields {
            // A missing translation leaves the token in place.
            if let Some(value) = value {
                let token = format!("{{package[{}].info.{field}.{lang}}}", self.package_id);
                replace_token(text, &token, || value.to_owned());
            }
        }
    }

    fn item_path(&self, kind: &str, key: &str) -> String {
        format!("package[{}].{kind}[{key}]", self.package_id)
    }

    /// Both addressings of a timed item: raw id, then duration label.
    fn timed_paths(&self, kind: &str, item: &TimedPrice) -> [String; 2] {
        [
            self.item_path(kind, &item.id),
            self.item_path(kind, &format_duration(item.minutes)),
        ]
    }
}

fn replace_token(text: &mut String, token: &str, value: impl FnOnce() -> String) {
    if text.contains(token) {
        *text = text.replace(token, &value());
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{EntryPrice, EntryPricing, PriceTier, Pricing};

    fn timed(id: &str, minutes: f64, pricing: Pricing) -> TimedPrice {
        TimedPrice {
            id: id.into(),
            minutes,
            pricing,
        }
    }

    fn hourly_package() -> PricingPackage {
        PricingPackage::new(vec![Module::HourlyPricing(HourlyPricing {
            maximums: vec![
                timed("1", 30.0, Pricing::Static(12.5)),
                timed(
                    "2",
                    1440.0,
                    Pricing::Dynamic(vec![
                        PriceTier { percent: 80.0, pricing: 40.0 },
                        PriceTier { percent: 50.0, pricing: 30.0 },
                        PriceTier { percent: 0.0, pricing: 20.0 },
                    ]),
                ),
            ],
            units: vec![timed("7", 15.0, Pricing::Static(2.0))],
        })])
    }

    fn info_package() -> PricingPackage {
        let mut info = PackageInfo::default();
        info.title.insert("fr".into(), "Tarif de jour".into());
        info.title.insert("en".into(), "Day rate".into());
        info.line1.insert("en".into(), "Open 24/7".into());
        PricingPackage::new(vec![
            Module::PackageInfo(info),
            Module::EntryPricing(EntryPricing {
                rows: vec![EntryPrice {
                    id: "9".into(),
                    pricing: Pricing::Static(15.0),
                }],
            }),
        ])
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(resolve("Welcome", &[], 0.0), "Welcome");
        assert_eq!(resolve("Welcome", &[hourly_package()], 0.0), "Welcome");
    }

    #[test]
    fn empty_packages_with_token_is_sentinel() {
        assert_eq!(resolve("{package[1].maximums[1].pricing.en}", &[], 0.0), SENTINEL);
        assert_eq!(resolve("no packages here", &[], 50.0), SENTINEL);
    }

    #[test]
    fn maximum_by_id_in_english() {
        let out = resolve("Max: {package[1].maximums[1].pricing.en}", &[hourly_package()], 0.0);
        assert_eq!(out, "Max: $12.50");
    }

    #[test]
    fn maximum_by_duration_matches_by_id() {
        let pkgs = [hourly_package()];
        assert_eq!(
            resolve("{package[1].maximums[30m].pricing.fr}", &pkgs, 0.0),
            resolve("{package[1].maximums[1].pricing.fr}", &pkgs, 0.0),
        );
        assert_eq!(resolve("{package[1].maximums[24h].minutes}", &pkgs, 0.0), "24h");
    }

    #[test]
    fn occupancy_zero_and_live_value() {
        let pkgs = [hourly_package()];
        let template = "Day {package[1].maximums[2].pricing-short.en}";
        assert_eq!(resolve(template, &pkgs, 0.0), "Day $20");
        assert_eq!(resolve(template, &pkgs, 63.0), "Day $30");
        assert_eq!(resolve(template, &pkgs, 95.0), "Day $40");
    }

    #[test]
    fn units_and_repeated_tokens() {
        let out = resolve(
            "{package[1].units[7].pricing.en} / {package[1].units[7].minutes} = {package[1].units[15m].pricing.en}",
            &[hourly_package()],
            0.0,
        );
        assert_eq!(out, "$2.00 / 15m = $2.00");
    }

    #[test]
    fn package_ids_follow_position() {
        let pkgs = [hourly_package(), info_package()];
        let out = resolve(
            "{package[2].info.title.fr}: {package[2].entry[9].pricing-short.fr} ({package[1].maximums[1].pricing.fr})",
            &pkgs,
            0.0,
        );
        assert_eq!(out, "Tarif de jour: 15\u{a0}$ (12,50\u{a0}$)");
    }

    #[test]
    fn missing_translation_is_sentinel() {
        let pkgs = [info_package()];
        assert_eq!(resolve("{package[1].info.line1.en}", &pkgs, 0.0), "Open 24/7");
        assert_eq!(resolve("{package[1].info.line1.fr}", &pkgs, 0.0), SENTINEL);
    }

    #[test]
    fn any_leftover_token_is_sentinel() {
        let pkgs = [hourly_package()];
        assert_eq!(
            resolve("{package[1].maximums[1].pricing.en} {package[3].entry[1].pricing.en}", &pkgs, 0.0),
            SENTINEL
        );
        assert_eq!(resolve("{package[1].maximums[99].pricing.en}", &pkgs, 0.0), SENTINEL);
    }

    #[test]
    fn output_never_contains_marker_except_sentinel() {
        let pkgs = [hourly_package(), info_package()];
        for template in [
            "package",
            "{package[1].units[7].minutes}",
            "{package[2].info.title.en} {package[2].info.line2.en}",
            "text with package word",
        ] {
            let out = resolve(template, &pkgs, 10.0);
            assert!(out == SENTINEL || !out.contains("package"), "{template} -> {out}");
        }
    }
}
