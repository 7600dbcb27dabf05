use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entry::{entry_tag_number, has_entry_tag};
use super::scan;

/// Known locations of the registered capital history, relative to `odpis.dane`,
/// in the order they are tried.
const CAPITAL_PATHS: [&[&str]; 3] = [
    &["dzial1", "kapital", "wysokoscKapitaluZakladowego"],
    &["kapital", "wysokoscKapitaluZakladowego"],
    &["dzialI", "kapital", "wysokoscKapitaluZakladowego"],
];

/// Registered capital before and after an entry, as the registry wrote them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalChange {
    pub poprzednia: Option<Value>,
    pub nowa: Option<Value>,
}

/// First non-empty capital history array found under `data`.
pub fn capital_history(data: &Value) -> Option<&Vec<Value>> {
    CAPITAL_PATHS
        .iter()
        .filter_map(|path| scan::path(data, path).and_then(Value::as_array))
        .find(|history| !history.is_empty())
}

/// Capital change introduced by entry `last`, if that entry set a new value.
///
/// The previous value is the one tagged with the highest entry number still
/// below `last`; it is `None` when `last` set the first recorded capital.
pub fn capital_change(data: &Value, last: u64) -> Option<CapitalChange> {
    let history = capital_history(data)?;
    let target = last.to_string();

    let current = history
        .iter()
        .filter_map(Value::as_object)
        .find(|record| has_entry_tag(record, &target))?;

    let mut previous: Option<(u64, Option<&Value>)> = None;
    for record in history.iter().filter_map(Value::as_object) {
        let Some(tag) = entry_tag_number(record) else {
            continue;
        };
        if tag >= last {
            continue;
        }
        if previous.map_or(true, |(best, _)| tag > best) {
            previous = Some((tag, record.get("wartosc")));
        }
    }

    let poprzednia = previous
        .and_then(|(_, value)| value)
        .filter(|v| !v.is_null())
        .cloned();
    let nowa = current.get("wartosc").filter(|v| !v.is_null()).cloned();
    log::debug!("Capital change at entry {}: {:?} -> {:?}", last, poprzednia, nowa);

    Some(CapitalChange { poprzednia, nowa })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data_with_history(history: Value) -> Value {
        json!({"dzial1": {"kapital": {"wysokoscKapitaluZakladowego": history}}})
    }

    fn sample() -> Value {
        data_with_history(json!([
            {"nrWpisuWprow": 5, "wartosc": "1000"},
            {"nrWpisuWprow": 7, "wartosc": "2000"},
            {"nrWpisuWprow": 9, "wartosc": "3000"}
        ]))
    }

    #[test]
    fn test_previous_is_nearest_lower_entry() {
        assert_eq!(
            capital_change(&sample(), 7),
            Some(CapitalChange {
                poprzednia: Some(json!("1000")),
                nowa: Some(json!("2000")),
            })
        );
        assert_eq!(
            capital_change(&sample(), 9).unwrap().poprzednia,
            Some(json!("2000"))
        );
    }

    #[test]
    fn test_first_capital_has_no_previous() {
        let change = capital_change(&sample(), 5).unwrap();
        assert_eq!(change.poprzednia, None);
        assert_eq!(change.nowa, Some(json!("1000")));
    }

    #[test]
    fn test_no_change_at_untagged_entry() {
        assert_eq!(capital_change(&sample(), 99), None);
    }

    #[test]
    fn test_string_tags_and_alternate_spelling() {
        let data = data_with_history(json!([
            {"nrWpisuaWprow": "12", "wartosc": "5 000,00"},
            {"nrWpisuWprow": "3", "wartosc": "50 000,00"},
            {"nrWpisuWprow": "1", "wartosc": "5 000,00"}
        ]));
        assert_eq!(
            capital_change(&data, 12),
            Some(CapitalChange {
                poprzednia: Some(json!("50 000,00")),
                nowa: Some(json!("5 000,00")),
            })
        );
    }

    #[test]
    fn test_path_priority() {
        let data = json!({
            "kapital": {"wysokoscKapitaluZakladowego": [{"nrWpisuWprow": "2", "wartosc": "B"}]},
            "dzialI": {"kapital": {"wysokoscKapitaluZakladowego": [{"nrWpisuWprow": "2", "wartosc": "C"}]}},
            "dzial1": {"kapital": {"wysokoscKapitaluZakladowego": []}}
        });
        assert_eq!(capital_change(&data, 2).unwrap().nowa, Some(json!("B")));
    }

    #[test]
    fn test_roman_section_path() {
        let data = json!({
            "dzialI": {"kapital": {"wysokoscKapitaluZakladowego": [{"nrWpisuWprow": "4", "wartosc": 100}]}}
        });
        assert_eq!(capital_change(&data, 4).unwrap().nowa, Some(json!(100)));
    }

    #[test]
    fn test_missing_history() {
        assert!(capital_history(&json!({"dzial1": {}})).is_none());
        assert_eq!(capital_change(&json!({}), 1), None);
        assert_eq!(capital_change(&json!(null), 1), None);
    }
}
