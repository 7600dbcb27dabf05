use serde_json::Value;

use super::entry::entry_tag_number;
use super::scan::{self, Object};
use super::section::DATA_PATH;

const IDENTITY_SECTIONS: [&str; 2] = ["dzial1", "dzialI"];
const IDENTITY_GROUPS: [&str; 2] = ["danePodmiotu", "podstawoweDane"];
const DIRECT_FIELDS: [&str; 2] = ["nazwa", "firma"];

/// Fields that may hold a name in the fallback scan, most specific first.
const CANDIDATE_FIELDS: [&str; 3] = ["firma", "nazwa", "nazwaSkrocona"];

fn non_empty(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

/// Current display name of the entity, or an empty string when none is found.
///
/// Well-known fields under the identity section are tried first. Otherwise the
/// identity section (or the whole record if it has none) is scanned for
/// name-like fields: the one tagged with the highest entry wins, and without
/// any tagged candidate the longest untagged string is used.
pub fn company_name(record: &Value) -> String {
    direct_name(record)
        .or_else(|| scanned_name(record))
        .unwrap_or_default()
}

fn direct_name(record: &Value) -> Option<String> {
    let data = scan::path(record, &DATA_PATH)?;
    for section in IDENTITY_SECTIONS {
        for group in IDENTITY_GROUPS {
            for field in DIRECT_FIELDS {
                if let Some(name) = scan::path(data, &[section, group, field]).and_then(non_empty) {
                    return Some(name.to_string());
                }
            }
        }
    }
    None
}

fn candidate(obj: &Object) -> Option<&str> {
    CANDIDATE_FIELDS
        .iter()
        .find_map(|field| obj.get(*field).and_then(non_empty))
}

fn scanned_name(record: &Value) -> Option<String> {
    let identity: Vec<&Value> = IDENTITY_SECTIONS
        .iter()
        .filter_map(|section| scan::path(record, &[DATA_PATH[0], DATA_PATH[1], *section]))
        .collect();
    let roots = if identity.is_empty() {
        vec![record]
    } else {
        identity
    };

    let mut tagged: Option<(u64, &str)> = None;
    let mut untagged: Option<&str> = None;

    for obj in roots.into_iter().flat_map(scan::objects) {
        let Some(name) = candidate(obj) else {
            continue;
        };
        match entry_tag_number(obj) {
            Some(tag) => {
                if tagged.map_or(true, |(best, _)| tag >= best) {
                    tagged = Some((tag, name));
                }
            }
            None => {
                if untagged.map_or(true, |best| name.chars().count() > best.chars().count()) {
                    untagged = Some(name);
                }
            }
        }
    }

    tagged
        .map(|(_, name)| name)
        .or(untagged)
        .map(str::to_string)
}
