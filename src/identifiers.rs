use anyhow::{anyhow, Result};
use csv::ReaderBuilder;
use itertools::Itertools;
use reqwest::Client;
use url::Url;

use crate::krs::Krs;

/// Pulls KRS numbers from the first column of a CSV export (e.g. a shared sheet).
///
/// Cells that are not a valid KRS number, header included, are skipped.
pub fn parse_sheet(content: &str) -> Vec<Krs> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    reader
        .records()
        .filter_map(|record| match record {
            Ok(record) => record.get(0).map(str::to_string),
            Err(e) => {
                log::warn!("Skipping malformed sheet row: {}", e);
                None
            }
        })
        .filter(|cell| {
            let cell = cell.trim();
            !cell.is_empty() && cell.chars().all(|c| c.is_ascii_digit())
        })
        .filter_map(|cell| Krs::new(&cell).ok())
        .collect()
}

pub async fn fetch_sheet(client: &Client, url: &Url) -> Result<Vec<Krs>> {
    log::debug!("Fetching KRS list from {}", url);
    let response = client.get(url.as_str()).send().await?;
    if !response.status().is_success() {
        return Err(anyhow!(
            "KRS sheet request failed with status: {}",
            response.status()
        ));
    }
    let content = response.text().await?;
    Ok(parse_sheet(&content))
}

/// Identifiers to watch: configured ones first, then the sheet, without repeats.
///
/// A sheet that cannot be fetched is logged and left out.
pub async fn collect(client: &Client, configured: &[Krs], sheet_url: Option<&Url>) -> Vec<Krs> {
    let from_sheet = match sheet_url {
        Some(url) => match fetch_sheet(client, url).await {
            Ok(list) => {
                log::info!("Loaded {} KRS numbers from sheet", list.len());
                list
            }
            Err(e) => {
                log::error!("Failed to load KRS sheet {}: {}", url, e);
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    configured
        .iter()
        .cloned()
        .chain(from_sheet)
        .unique()
        .collect()
}
