//! Text helpers shared by the serializers

use std::borrow::Cow;

use rust_decimal::{Decimal, RoundingStrategy};

use super::SerializeError;

fn is_stripped_control(c: char) -> bool {
    (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r')
}

/// Remove control characters below 0x20 other than TAB, LF and CR
pub fn strip_controls(input: &str) -> Cow<'_, str> {
    if input.chars().any(is_stripped_control) {
        Cow::Owned(input.chars().filter(|c| !is_stripped_control(*c)).collect())
    } else {
        Cow::Borrowed(input)
    }
}

/// Strip controls and escape `& < > " '` for XML text and attribute content
pub fn xml_text(input: &str) -> Cow<'_, str> {
    let clean = strip_controls(input);
    if !clean.contains(['&', '<', '>', '"', '\'']) {
        return clean;
    }

    let mut out = String::with_capacity(clean.len() + 16);
    for c in clean.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// RFC 4180 field: quoted when it contains `, " \n \r` (or when forced)
pub fn csv_field(input: &str, force_quote: bool) -> Cow<'_, str> {
    let clean = strip_controls(input);
    if !force_quote && !clean.contains([',', '"', '\n', '\r']) {
        return clean;
    }
    Cow::Owned(format!("\"{}\"", clean.replace('"', "\"\"")))
}

/// `"<amount> <ISO-4217>"` with two decimal places
pub fn format_price(amount: Decimal, currency: &str) -> Result<String, SerializeError> {
    let valid = currency.len() == 3 && currency.bytes().all(|b| b.is_ascii_uppercase());
    if !valid {
        return Err(SerializeError::InvalidField {
            field: "currency",
            reason: format!("'{}' is not an ISO-4217 code", currency),
        });
    }
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    Ok(format!("{} {}", rounded, currency))
}
