use serde_json::Value;

/// Grouping separator used by the pl-PL locale (no-break space).
const GROUP_SEPARATOR: char = '\u{a0}';
const CURRENCY_SUFFIX: &str = "\u{a0}zł";

/// Parses a Polish-formatted number such as `"1 234,50"` or `"5.000,00"`.
///
/// Spaces and dots are treated as thousand separators and dropped, the first
/// comma becomes the decimal point. Anything that does not end up as a finite
/// number yields `NaN`; callers check `is_finite()`.
pub fn parse_locale_number(text: &str) -> f64 {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{a0}' | '.'))
        .collect();
    let cleaned = cleaned.replacen(',', ".", 1);

    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => f64::NAN,
    }
}

/// Numeric reading of a registry value, which may be a JSON number or a
/// locale-formatted string.
pub fn value_to_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|n| n.is_finite()).unwrap_or(f64::NAN),
        Value::String(s) => parse_locale_number(s),
        _ => f64::NAN,
    }
}

/// Renders a capital value as PLN currency, e.g. `12 345,00 zł`.
///
/// Values that do not parse are returned as they came in.
pub fn format_pln(value: &Value) -> String {
    let n = value_to_number(value);
    if !n.is_finite() {
        return match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
    }
    format_amount(n)
}

fn format_amount(n: f64) -> String {
    let formatted = format!("{:.2}", n.abs());
    let (int_part, dec_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    // pl-PL only groups integers of five digits or more
    let grouped = if int_part.len() > 4 {
        let mut result = String::new();
        for (i, c) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                result.push(GROUP_SEPARATOR);
            }
            result.push(c);
        }
        result
    } else {
        int_part.to_string()
    };

    let sign = if n < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{}{},{}{}", sign, grouped, dec_part, CURRENCY_SUFFIX)
}
