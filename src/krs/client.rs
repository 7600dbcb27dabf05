use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use mime::APPLICATION_JSON;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::identifier::Krs;

pub const KRS_API_URL: &str = "https://api-krs.ms.gov.pl/api/krs";
pub const USER_AGENT: &str = "krs-watcher/0.1 (+https://github.com/krs-watcher)";

/// Register of entrepreneurs first, then associations.
const REGISTERS: [&str; 2] = ["P", "S"];

/// Anything that can hand back a full KRS extract for an identifier.
#[async_trait]
pub trait RegistrySource: Send + Sync {
    async fn fetch(&self, krs: &Krs) -> Result<Value>;

    /// Public link to the extract, used as the source reference in notifications.
    fn registry_url(&self, krs: &Krs) -> String;
}

/// HTTP client for the public KRS API.
#[derive(Clone, Debug)]
pub struct KrsClient {
    client: Client,
    base_url: Url,
}

impl KrsClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, base_url })
    }

    fn extract_url(&self, krs: &Krs, register: &str) -> String {
        format!(
            "{}/OdpisPelny/{}?rejestr={}&format=json",
            self.base_url.as_str().trim_end_matches('/'),
            krs,
            register
        )
    }

    async fn fetch_register(&self, krs: &Krs, register: &str) -> Result<Option<Value>> {
        let url = self.extract_url(krs, register);
        log::debug!("Fetching KRS extract from {}", url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, APPLICATION_JSON.as_ref())
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        log::debug!("Response status: {}", response.status());

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP request for KRS {} failed with status: {}",
                krs,
                response.status()
            ));
        }

        let content = response.text().await?;
        log::debug!("Received content length: {}", content.len());

        let value = serde_json::from_str::<Value>(&content)
            .map_err(|e| anyhow!("Invalid JSON in KRS response for {}: {}", krs, e))?;
        Ok(Some(value))
    }
}

#[async_trait]
impl RegistrySource for KrsClient {
    async fn fetch(&self, krs: &Krs) -> Result<Value> {
        for register in REGISTERS {
            if let Some(value) = self.fetch_register(krs, register).await? {
                return Ok(value);
            }
            log::debug!("KRS {} not found in register {}", krs, register);
        }
        Err(anyhow!("KRS {} not found in any register", krs))
    }

    fn registry_url(&self, krs: &Krs) -> String {
        self.extract_url(krs, REGISTERS[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_url() {
        let client = KrsClient::new(
            Url::parse("https://api-krs.ms.gov.pl/api/krs/").unwrap(),
            Duration::from_secs(5),
        )
        .unwrap();
        let krs = Krs::new("28098").unwrap();
        assert_eq!(
            client.registry_url(&krs),
            "https://api-krs.ms.gov.pl/api/krs/OdpisPelny/0000028098?rejestr=P&format=json"
        );
    }
}
