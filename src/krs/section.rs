use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use strum::{EnumIter, IntoEnumIterator};

use super::entry::has_entry_tag;
use super::scan;

/// Path to the sections ("działy") inside a full extract.
pub const DATA_PATH: [&str; 2] = ["odpis", "dane"];

static SECTION_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^dzial").unwrap());

/// The six fixed divisions of a KRS extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Section {
    Dzial1,
    Dzial2,
    Dzial3,
    Dzial4,
    Dzial5,
    Dzial6,
}

/// Every known key spelling mapped to its division.
static SPELLINGS: Lazy<HashMap<&'static str, Section>> = Lazy::new(|| {
    Section::iter()
        .flat_map(|section| {
            let [arabic, roman] = section.keys();
            [(arabic, section), (roman, section)]
        })
        .collect()
});

impl Section {
    /// Arabic and roman key spellings, e.g. `dzial3` and `dzialIII`.
    pub fn keys(&self) -> [&'static str; 2] {
        match self {
            Section::Dzial1 => ["dzial1", "dzialI"],
            Section::Dzial2 => ["dzial2", "dzialII"],
            Section::Dzial3 => ["dzial3", "dzialIII"],
            Section::Dzial4 => ["dzial4", "dzialIV"],
            Section::Dzial5 => ["dzial5", "dzialV"],
            Section::Dzial6 => ["dzial6", "dzialVI"],
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Section::Dzial1 => "Dział I – Dane podmiotu i kapitał",
            Section::Dzial2 => "Dział II – Organy i reprezentacja",
            Section::Dzial3 => "Dział III – PKD, sprawozdania, wzmianki",
            Section::Dzial4 => "Dział IV – Postępowania, upadłości",
            Section::Dzial5 => "Dział V – Połączenia, podziały, przekształcenia",
            Section::Dzial6 => "Dział VI – Wzmianki różne",
        }
    }

    pub fn from_key(key: &str) -> Option<Section> {
        SPELLINGS.get(key).copied()
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

pub fn is_section_key(key: &str) -> bool {
    SECTION_KEY.is_match(key)
}

/// Human-readable label for a section key; unknown keys are returned as-is.
pub fn describe_key(key: &str) -> String {
    Section::from_key(key)
        .map(|section| section.description().to_string())
        .unwrap_or_else(|| key.to_string())
}

/// Descriptions of the sections touched by entry `last`.
///
/// A section counts as touched when any object anywhere below it carries an
/// entry tag equal to `last`. Order follows the keys of `data`; a division
/// reached under both spellings is reported once.
pub fn touched_sections(data: &Value, last: u64) -> Vec<String> {
    let Some(sections) = data.as_object() else {
        return Vec::new();
    };
    let target = last.to_string();

    sections
        .iter()
        .filter(|(key, _)| is_section_key(key))
        .filter(|(_, subtree)| scan::any(subtree, |obj| has_entry_tag(obj, &target)))
        .map(|(key, _)| describe_key(key))
        .unique()
        .collect()
}
