use serde_json::Value;

use super::scan::{self, Object};

/// Both spellings of the "introduced by entry" tag seen in registry extracts.
pub const ENTRY_TAG_FIELDS: [&str; 2] = ["nrWpisuWprow", "nrWpisuaWprow"];

/// Path to the filing entry list inside a full extract.
pub const ENTRIES_PATH: [&str; 3] = ["odpis", "naglowekP", "wpis"];

/// String form of a tag value; the registry mixes numbers and numeric strings.
fn tag_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// True when either tag field of `obj` reads exactly as `target`.
pub fn has_entry_tag(obj: &Object, target: &str) -> bool {
    ENTRY_TAG_FIELDS
        .iter()
        .filter_map(|field| obj.get(*field).and_then(tag_string))
        .any(|tag| tag == target)
}

/// Numeric value of the first usable tag field, if any.
pub fn entry_tag_number(obj: &Object) -> Option<u64> {
    ENTRY_TAG_FIELDS
        .iter()
        .filter_map(|field| obj.get(*field))
        .find_map(entry_number)
}

/// Reads an entry number from a JSON number or a numeric string.
pub fn entry_number(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Highest `numerWpisu` among the record's filing entries.
///
/// An absent or empty list is an error. Entries without a readable number count
/// as 0, so a list of malformed entries resolves to 0 rather than failing.
pub fn latest_entry(record: &Value) -> Result<u64, String> {
    let entries = scan::path(record, &ENTRIES_PATH)
        .and_then(Value::as_array)
        .filter(|entries| !entries.is_empty())
        .ok_or_else(|| "Brak sekcji odpis.naglowekP.wpis".to_string())?;

    Ok(entries
        .iter()
        .map(|entry| entry.get("numerWpisu").and_then(entry_number).unwrap_or(0))
        .max()
        .unwrap_or(0))
}
