use krs_watcher::krs::money::{format_pln, parse_locale_number};
use krs_watcher::krs::{analyze_odpis, analyze_odpis_at, CapitalChange};
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;

fn read_fixture(filename: &str) -> Value {
    let path = PathBuf::from("tests/data").join(filename);
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read test file {}: {}", filename, e));
    serde_json::from_str(&content).unwrap()
}

#[test]
fn test_full_extract_latest_entry() {
    let record = read_fixture("odpis_pelny_0000028098.json");
    let analysis = analyze_odpis(&record);

    assert!(analysis.ok);
    assert_eq!(analysis.error, None);
    assert_eq!(analysis.last, Some(31));
    assert_eq!(analysis.dzialy, vec!["Dział I – Dane podmiotu i kapitał"]);
    assert_eq!(
        analysis.kapital,
        Some(CapitalChange {
            poprzednia: Some(json!("1 000 000,00")),
            nowa: Some(json!("1 250 000,00")),
        })
    );
    assert_eq!(analysis.name, "INC SPÓŁKA AKCYJNA");
}

#[test]
fn test_full_extract_earlier_entries() {
    let record = read_fixture("odpis_pelny_0000028098.json");

    let board_change = analyze_odpis_at(&record, Some(30));
    assert_eq!(board_change.dzialy, vec!["Dział II – Organy i reprezentacja"]);
    assert_eq!(board_change.kapital, None);

    let conversion = analyze_odpis_at(&record, Some(12));
    assert_eq!(conversion.dzialy, vec!["Dział I – Dane podmiotu i kapitał"]);
    assert_eq!(
        conversion.kapital,
        Some(CapitalChange {
            poprzednia: Some(json!("50000,00")),
            nowa: Some(json!("1 000 000,00")),
        })
    );

    let registration = analyze_odpis_at(&record, Some(1));
    assert_eq!(
        registration.dzialy,
        vec![
            "Dział I – Dane podmiotu i kapitał",
            "Dział II – Organy i reprezentacja"
        ]
    );
    assert_eq!(registration.kapital.unwrap().poprzednia, None);
}

#[test]
fn test_capital_values_render_as_pln() {
    let record = read_fixture("odpis_pelny_0000028098.json");
    let change = analyze_odpis(&record).kapital.unwrap();
    assert_eq!(
        format_pln(change.nowa.as_ref().unwrap()),
        "1\u{a0}250\u{a0}000,00\u{a0}zł"
    );
    assert_eq!(parse_locale_number("1 250 000,00"), 1_250_000.0);
}

#[test]
fn test_roman_spelling_extract() {
    let record = json!({
        "odpis": {
            "naglowekP": {"wpis": [{"numerWpisu": "4"}, {"numerWpisu": "3"}]},
            "dane": {
                "dzialI": {
                    "podstawoweDane": {"firma": "OMEGA SP. Z O.O."},
                    "kapital": {"wysokoscKapitaluZakladowego": [
                        {"nrWpisuaWprow": 3, "wartosc": 5000},
                        {"nrWpisuaWprow": 4, "wartosc": 8000}
                    ]}
                },
                "dzialIII": {"pkd": [{"kod": "62.01.Z", "nrWpisuWprow": 4}]}
            }
        }
    });
    let analysis = analyze_odpis(&record);

    assert_eq!(analysis.last, Some(4));
    assert_eq!(
        analysis.dzialy,
        vec![
            "Dział I – Dane podmiotu i kapitał",
            "Dział III – PKD, sprawozdania, wzmianki"
        ]
    );
    assert_eq!(
        analysis.kapital,
        Some(CapitalChange {
            poprzednia: Some(json!(5000)),
            nowa: Some(json!(8000)),
        })
    );
    assert_eq!(analysis.name, "OMEGA SP. Z O.O.");
}

#[test]
fn test_unchanged_record_is_stable() {
    let record = read_fixture("odpis_pelny_0000028098.json");
    assert_eq!(analyze_odpis(&record), analyze_odpis(&record));
}

#[test]
fn test_records_without_entries_fail() {
    for record in [
        json!(null),
        json!({}),
        json!({"odpis": null}),
        json!({"odpis": {"naglowekP": {}}}),
        json!({"odpis": {"naglowekP": {"wpis": []}}}),
    ] {
        let analysis = analyze_odpis(&record);
        assert!(!analysis.ok, "expected failure for {}", record);
        assert!(analysis.error.is_some());
        assert_eq!(analysis.last, None);
    }
}
