//! Escaping and value formatting shared by the render functions.

use std::borrow::Cow;

use serde_json::Value;

pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

/// Fixed-point formatting with `decimals` digits after the point. Exact ties
/// round away from zero, as a browser's `toFixed` does.
pub fn fixed(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value.is_sign_negative() {
            "-Infinity".to_string()
        } else {
            "Infinity".to_string()
        };
    }
    let digits = round_half_away(value.abs(), decimals);
    // Values that round to zero print unsigned.
    if value.is_sign_negative() && digits.chars().any(|c| c != '0' && c != '.') {
        format!("-{digits}")
    } else {
        digits
    }
}

/// Largest number of fractional digits a finite `f64` can have.
const EXACT_FRACTION_DIGITS: usize = 1074;

fn round_half_away(magnitude: f64, decimals: usize) -> String {
    let rounded = format!("{magnitude:.decimals$}");
    if decimals >= EXACT_FRACTION_DIGITS {
        return rounded;
    }
    let exact = format!("{magnitude:.precision$}", precision = EXACT_FRACTION_DIGITS);
    let Some((_, fraction)) = exact.split_once('.') else {
        return rounded;
    };
    let tail = &fraction[decimals..];
    let is_tie = tail.starts_with('5') && tail[1..].chars().all(|c| c == '0');
    if !is_tie {
        return rounded;
    }
    let truncated = exact[..exact.len() - tail.len()].trim_end_matches('.');
    increment_last_digit(truncated)
}

/// Adds one unit in the last place of a plain decimal string.
fn increment_last_digit(digits: &str) -> String {
    let mut chars: Vec<char> = digits.chars().collect();
    let mut carry = true;
    for ch in chars.iter_mut().rev() {
        match *ch {
            '.' => {}
            '9' => *ch = '0',
            digit => {
                *ch = char::from(digit as u8 + 1);
                carry = false;
                break;
            }
        }
    }
    let mut out: String = chars.into_iter().collect();
    if carry {
        out.insert(0, '1');
    }
    out
}

/// Text for a value shown "as-is", following how a browser stringifies JSON
/// values in a template.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => display_number(number),
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display_value(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn display_number(number: &serde_json::Number) -> String {
    if let Some(int) = number.as_i64() {
        return int.to_string();
    }
    if let Some(uint) = number.as_u64() {
        return uint.to_string();
    }
    match number.as_f64() {
        Some(float) => format!("{float}"),
        None => number.to_string(),
    }
}
