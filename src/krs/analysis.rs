use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::capital::{capital_change, CapitalChange};
use super::entry::latest_entry;
use super::name::company_name;
use super::scan;
use super::section::{touched_sections, DATA_PATH};

/// Outcome of analysing one registry extract.
///
/// `ok` is false only when the extract has no usable entry list; every other
/// gap shows up as an empty or `None` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub ok: bool,
    pub error: Option<String>,
    pub last: Option<u64>,
    pub dzialy: Vec<String>,
    pub kapital: Option<CapitalChange>,
    pub name: String,
}

impl AnalysisResult {
    pub fn failed(error: impl Into<String>) -> Self {
        AnalysisResult {
            ok: false,
            error: Some(error.into()),
            last: None,
            dzialy: Vec::new(),
            kapital: None,
            name: String::new(),
        }
    }
}

/// Runs the full change analysis over a KRS extract ("odpis").
pub fn analyze_odpis(record: &Value) -> AnalysisResult {
    analyze_odpis_at(record, None)
}

/// Like [`analyze_odpis`], but reports on `entry` instead of the latest entry
/// when one is given. The extract must still carry its entry list.
pub fn analyze_odpis_at(record: &Value, entry: Option<u64>) -> AnalysisResult {
    if record.get("odpis").map_or(true, Value::is_null) {
        return AnalysisResult::failed("Brak pola odpis");
    }

    let last = match latest_entry(record) {
        Ok(latest) => entry.unwrap_or(latest),
        Err(e) => return AnalysisResult::failed(e),
    };

    let no_data = Value::Null;
    let data = scan::path(record, &DATA_PATH).unwrap_or(&no_data);
    let dzialy = touched_sections(data, last);
    let kapital = capital_change(data, last);
    let name = company_name(record);

    log::debug!(
        "Analysed entry {} ({}): sections {:?}, capital change: {}",
        last,
        name,
        dzialy,
        kapital.is_some()
    );

    AnalysisResult {
        ok: true,
        error: None,
        last: Some(last),
        dzialy,
        kapital,
        name,
    }
}
