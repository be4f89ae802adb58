// ── Formatting primitives ──
//
// Canadian-dollar amounts in the two display languages, and the coarse
// duration labels used by hourly tokens. Output matches what the kiosk
// screens have always shown: `$1,234.50` / `1 234,50 $` (no-break spaces
// in French) and `45m` / `2h`.

use std::fmt::Write as _;

use crate::model::Language;

const NBSP: char = '\u{a0}';

/// Duration label: under an hour in minutes, otherwise whole hours
/// (remainder dropped). `NaN` renders as `0m`.
pub fn format_duration(minutes: f64) -> String {
    if minutes.is_nan() {
        return "0m".into();
    }
    if minutes < 60.0 {
        return format!("{}m", plain_number(minutes));
    }
    format!("{}h", plain_number((minutes / 60.0).floor()))
}

/// Full currency form with two decimals.
pub fn format_cad(amount: f64, lang: Language) -> String {
    render_cad(amount, lang, false)
}

/// Abbreviated currency form: whole amounts drop the decimals.
pub fn format_cad_short(amount: f64, lang: Language) -> String {
    render_cad(amount, lang, true)
}

/// Integral values without a trailing `.0`, and no negative zero.
fn plain_number(n: f64) -> String {
    if n == 0.0 {
        return "0".into();
    }
    n.to_string()
}

fn render_cad(amount: f64, lang: Language, short: bool) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let cents = to_cents(amount.abs());
    let negative = amount < 0.0 && cents > 0;
    let (whole, frac) = (cents / 100, cents % 100);

    let (group, decimal) = match lang {
        Language::En => (',', '.'),
        Language::Fr => (NBSP, ','),
    };

    let mut number = group_thousands(whole, group);
    if !(short && frac == 0) {
        number.push(decimal);
        let _ = write!(number, "{frac:02}");
    }

    let sign = if negative { "-" } else { "" };
    match lang {
        Language::En => format!("{sign}${number}"),
        Language::Fr => format!("{sign}{number}{NBSP}$"),
    }
}

/// Round half away from zero to whole cents. `amount` is non-negative.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
fn to_cents(amount: f64) -> u64 {
    const CEILING: f64 = 1e18;
    (amount * 100.0).round().clamp(0.0, CEILING) as u64
}

fn group_thousands(value: u64, separator: char) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}
