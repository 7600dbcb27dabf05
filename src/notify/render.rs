use html_escape::encode_text;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::krs::money::format_pln;
use crate::krs::{AnalysisResult, Krs};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub subject: String,
    pub text: String,
    pub html: String,
}

fn display_value(value: Option<&Value>) -> String {
    value.map(format_pln).unwrap_or_else(|| "-".to_string())
}

/// Builds the notification for a new entry on `krs`.
pub fn render_email(
    krs: &Krs,
    analysis: &AnalysisResult,
    previous_last: Option<u64>,
    source_url: &str,
) -> EmailMessage {
    let last = analysis
        .last
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".to_string());

    let mut subject = format!("KRS {} – nowy wpis {}", krs, last);
    if !analysis.name.is_empty() {
        subject.push_str(&format!(" – {}", analysis.name));
    }

    let sections = if analysis.dzialy.is_empty() {
        "—".to_string()
    } else {
        analysis.dzialy.join(", ")
    };
    let capital = analysis.kapital.as_ref().map(|change| {
        (
            display_value(change.poprzednia.as_ref()),
            display_value(change.nowa.as_ref()),
        )
    });

    let mut text = format!("KRS {} – nowy wpis {}\n", krs, last);
    if !analysis.name.is_empty() {
        text.push_str(&format!("Nazwa: {}\n", analysis.name));
    }
    if let Some(previous) = previous_last {
        text.push_str(&format!("Poprzedni wpis: {}\n", previous));
    }
    text.push_str(&format!("Działy: {}\n", sections));
    match &capital {
        Some((before, after)) => text.push_str(&format!(
            "Kapitał: zmiana (poprzednia: {}, nowa: {})\n",
            before, after
        )),
        None => text.push_str("Kapitał: brak zmian\n"),
    }
    text.push_str(&format!("\nŹródło: {}", source_url));

    let html = render_html(krs, analysis, &last, previous_last, capital.as_ref(), source_url);

    EmailMessage { subject, text, html }
}

fn render_html(
    krs: &Krs,
    analysis: &AnalysisResult,
    last: &str,
    previous_last: Option<u64>,
    capital: Option<&(String, String)>,
    source_url: &str,
) -> String {
    let name = if analysis.name.is_empty() {
        String::new()
    } else {
        format!(
            r#"<div style="margin:0 0 6px 0;font-weight:600">{}</div>"#,
            encode_text(&analysis.name)
        )
    };
    let previous = previous_last
        .map(|p| {
            format!(
                r#"<div style="color:#6b7280;font-size:12px">Poprzedni wpis: {}</div>"#,
                p
            )
        })
        .unwrap_or_default();
    let sections = if analysis.dzialy.is_empty() {
        r#"<span style="color:#6b7280">—</span>"#.to_string()
    } else {
        analysis
            .dzialy
            .iter()
            .map(|d| format!("<div>{}</div>", encode_text(d)))
            .collect::<String>()
    };
    let capital = match capital {
        Some((before, after)) => format!(
            r#"<div style="margin-top:8px">Kapitał: zmiana (poprzednia: <b>{}</b>, nowa: <b>{}</b>)</div>"#,
            encode_text(before),
            encode_text(after)
        ),
        None => r#"<div style="margin-top:8px;color:#6b7280">Kapitał: brak zmian</div>"#.to_string(),
    };
    let url = html_escape::encode_double_quoted_attribute(source_url);

    format!(
        r#"<div style="font-family:ui-sans-serif,system-ui,-apple-system,Segoe UI,Roboto,Helvetica,Arial;color:#111827">
<h2 style="margin:0 0 8px 0;font-size:18px">KRS {krs} – nowy wpis <span style="font-family:ui-monospace,monospace">{last}</span></h2>
{name}{previous}
<div style="margin:6px 0 0 0;color:#374151">Działy:</div>
<div style="margin-top:4px">{sections}</div>
{capital}
<p style="margin-top:12px;font-size:12px;color:#6b7280">Źródło: <a href="{url}" style="color:#2563eb;text-decoration:none">{text_url}</a></p>
</div>"#,
        krs = krs,
        last = encode_text(last),
        name = name,
        previous = previous,
        sections = sections,
        capital = capital,
        url = url,
        text_url = encode_text(source_url),
    )
}
