use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::krs::client::KRS_API_URL;
use crate::krs::Krs;
use crate::schedule::{parse_timezone, SendWindow};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_MAIL_FROM: &str = "KRS Watcher <noreply@example.com>";

/// Raw shape of `config.json`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    #[serde(default)]
    krs: Vec<Value>,
    krs_sheet_url: Option<String>,
    #[serde(default)]
    recipients: Vec<String>,
    send_only_on_change: Option<bool>,
    send_at: Option<String>,
    send_tz: Option<String>,
    api_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    state_file: Option<PathBuf>,
    mail_from: Option<String>,
    outbox_dir: Option<PathBuf>,
    mail_webhook_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct WatcherConfig {
    pub krs: Vec<Krs>,
    pub krs_sheet_url: Option<Url>,
    pub recipients: Vec<String>,
    pub send_only_on_change: bool,
    pub send_at: SendWindow,
    pub api_base_url: Url,
    pub request_timeout: Duration,
    pub state_file: PathBuf,
    pub mail_from: String,
    pub outbox_dir: PathBuf,
    pub mail_webhook_url: Option<Url>,
    pub smtp: Option<SmtpSettings>,
}

pub const DEFAULT_SMTP_PORT: u16 = 587;

/// SMTP relay settings, taken from `SMTP_HOST`, `SMTP_PORT`, `SMTP_USER` and `SMTP_PASS`.
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub credentials: Option<(String, String)>,
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.credentials.as_ref().map(|(user, _)| user))
            .finish()
    }
}

impl SmtpSettings {
    /// `None` when `SMTP_HOST` is unset; partial credentials are an error.
    pub fn from_env<F>(env: F) -> Result<Option<Self>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(host) = env("SMTP_HOST").map(|h| h.trim().to_string()).filter(|h| !h.is_empty())
        else {
            return Ok(None);
        };
        let port = match env("SMTP_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| anyhow!("Invalid SMTP_PORT {:?}", raw))?,
            None => DEFAULT_SMTP_PORT,
        };
        let credentials = match (env("SMTP_USER"), env("SMTP_PASS")) {
            (Some(user), Some(pass)) => Some((user, pass)),
            (None, None) => None,
            _ => return Err(anyhow!("SMTP_USER and SMTP_PASS must be set together")),
        };
        Ok(Some(Self {
            host,
            port,
            credentials,
        }))
    }
}

impl WatcherConfig {
    /// Reads the config file and applies environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Missing config file {}", path.display()))?;
        Self::from_json(&content, |key| std::env::var(key).ok())
    }

    pub fn from_json<F>(content: &str, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file: ConfigFile =
            serde_json::from_str(content).map_err(|e| anyhow!("Invalid config JSON: {}", e))?;

        let krs = file
            .krs
            .iter()
            .filter_map(|raw| match Krs::try_from(raw.clone()) {
                Ok(krs) => Some(krs),
                Err(e) => {
                    log::warn!("Skipping config entry {}: {}", raw, e);
                    None
                }
            })
            .collect();

        let recipients: Vec<String> = match env("MAIL_TO") {
            Some(list) => split_recipients(&list),
            None => file
                .recipients
                .iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect(),
        };
        if recipients.is_empty() {
            return Err(anyhow!("config.recipients must list at least one address"));
        }

        let mut send_at = match env("KRS_SEND_AT").or(file.send_at) {
            Some(raw) => raw.parse::<SendWindow>()?,
            None => SendWindow::default(),
        };
        if let Some(tz) = env("KRS_SEND_TZ").or(file.send_tz) {
            send_at = send_at.with_timezone(parse_timezone(&tz)?);
        }

        let smtp = SmtpSettings::from_env(&env)?;

        let api_base_url = parse_url(
            "apiBaseUrl",
            &env("KRS_API_URL")
                .or(file.api_base_url)
                .unwrap_or_else(|| KRS_API_URL.to_string()),
        )?;

        let krs_sheet_url = env("KRS_SHEET_URL")
            .or(file.krs_sheet_url)
            .map(|raw| parse_url("krsSheetUrl", &raw))
            .transpose()?;

        let mail_webhook_url = env("MAIL_WEBHOOK_URL")
            .or(file.mail_webhook_url)
            .map(|raw| parse_url("mailWebhookUrl", &raw))
            .transpose()?;

        Ok(Self {
            krs,
            krs_sheet_url,
            recipients,
            send_only_on_change: file.send_only_on_change.unwrap_or(true),
            send_at,
            api_base_url,
            request_timeout: Duration::from_secs(file.request_timeout_secs.unwrap_or(30)),
            state_file: env("KRS_STATE_FILE")
                .map(PathBuf::from)
                .or(file.state_file)
                .unwrap_or_else(|| PathBuf::from("state.json")),
            mail_from: env("MAIL_FROM")
                .or(file.mail_from)
                .unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string()),
            outbox_dir: env("KRS_OUTBOX_DIR")
                .map(PathBuf::from)
                .or(file.outbox_dir)
                .unwrap_or_else(|| PathBuf::from("outbox")),
            mail_webhook_url,
            smtp,
        })
    }
}

fn split_recipients(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_url(field: &str, raw: &str) -> Result<Url> {
    Url::parse(raw.trim()).map_err(|e| anyhow!("Invalid {} {:?}: {}", field, raw, e))
}
