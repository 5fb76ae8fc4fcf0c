//! Fixed-point conversions between the ledger's decimal string amounts
//! (7-digit fraction, e.g. `"3.1415926"`) and the `i64` stroop
//! representation used internally (1 unit = 10_000_000 stroops).

use crate::types::Amount;

const STROOPS_PER_UNIT: i64 = 10_000_000;

/// Parse a ledger decimal-string amount into stroops.
pub fn parse_amount(s: &str) -> Option<Amount> {
    let s = s.trim();
    let mut parts = s.splitn(2, '.');
    let whole: i64 = parts.next()?.parse().ok()?;
    let frac_str = parts.next().unwrap_or("0");
    if frac_str.len() > 7 || !frac_str.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let frac_padded = format!("{frac_str:0<7}");
    let frac: i64 = frac_padded.parse().ok()?;
    if whole < 0 {
        return None;
    }
    Some(whole * STROOPS_PER_UNIT + frac)
}

/// Format stroops back into the ledger's canonical 7-digit decimal string.
pub fn format_amount(stroops: Amount) -> String {
    let whole = stroops / STROOPS_PER_UNIT;
    let frac = stroops % STROOPS_PER_UNIT;
    format!("{whole}.{frac:07}")
}
