//! Price display formatting.
//!
//! Prices render with dot-grouped thousands and a comma decimal separator
//! (`1234567.5` → `1.234.567,5`), matching the in-game locale.

use data::LpValue;

pub const ABSENT: &str = "—";

pub fn format_price(value: f64) -> String {
    let negative = value < 0.0;
    let s = format!("{:.2}", value.abs());
    let (int_part, frac_part) = s.split_once('.').expect("{:.2} always has a dot");
    let frac_part = frac_part.trim_end_matches('0');

    let grouped = group_thousands(int_part);
    let out = if frac_part.is_empty() {
        grouped
    } else {
        format!("{grouped},{frac_part}")
    };
    if negative { format!("-{out}") } else { out }
}

fn group_thousands(digits: &str) -> String {
    let rem = digits.len() % 3;
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && i % 3 == rem {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// Project a slot value for display: comments verbatim (numeric-looking ones
/// are reformatted), prices formatted, absent slots as a dash.
pub fn display_value(value: &LpValue) -> String {
    match value {
        LpValue::Absent => ABSENT.to_string(),
        LpValue::Price(v) => format_price(*v),
        LpValue::Comment(c) => match c.trim().replace(',', ".").parse::<f64>() {
            Ok(v) => format_price(v),
            Err(_) => c.clone(),
        },
    }
}
