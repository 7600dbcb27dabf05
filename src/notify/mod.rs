pub mod render;
pub mod smtp;

pub use render::{render_email, EmailMessage};
pub use smtp::SmtpNotifier;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Local;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

use crate::core::config::{SmtpSettings, WatcherConfig};

const BOUNDARY: &str = "krs-watcher-alternative";

/// A rendered message together with its addressing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub from: String,
    pub to: Vec<String>,
    #[serde(flatten)]
    pub message: EmailMessage,
}

/// Delivery of rendered notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, envelope: &Envelope) -> Result<()>;
}

/// Drops each message as an `.eml` file into a directory for pickup by a mailer.
pub struct OutboxNotifier {
    dir: PathBuf,
    sequence: AtomicUsize,
}

impl OutboxNotifier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            sequence: AtomicUsize::new(0),
        }
    }
}

/// RFC 5322 message with a plain-text and an HTML alternative.
pub fn to_eml(envelope: &Envelope) -> String {
    let message = &envelope.message;
    format!(
        "From: {from}\r\n\
         To: {to}\r\n\
         Subject: {subject}\r\n\
         Date: {date}\r\n\
         MIME-Version: 1.0\r\n\
         Content-Type: multipart/alternative; boundary=\"{boundary}\"\r\n\
         \r\n\
         --{boundary}\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\
         Content-Transfer-Encoding: 8bit\r\n\
         \r\n\
         {text}\r\n\
         --{boundary}\r\n\
         Content-Type: text/html; charset=utf-8\r\n\
         Content-Transfer-Encoding: 8bit\r\n\
         \r\n\
         {html}\r\n\
         --{boundary}--\r\n",
        from = envelope.from,
        to = envelope.to.join(", "),
        subject = message.subject,
        date = Local::now().to_rfc2822(),
        boundary = BOUNDARY,
        text = message.text,
        html = message.html,
    )
}

#[async_trait]
impl Notifier for OutboxNotifier {
    async fn send(&self, envelope: &Envelope) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let n = self.sequence.fetch_add(1, Ordering::SeqCst);
        let path = self
            .dir
            .join(format!("{}-{:03}.eml", Local::now().format("%Y%m%dT%H%M%S"), n));
        fs::write(&path, to_eml(envelope))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Queued \"{}\" in {}", envelope.message.subject, path.display());
        Ok(())
    }
}

/// Posts each envelope as JSON to an HTTP mail relay.
pub struct WebhookNotifier {
    client: Client,
    url: Url,
}

impl WebhookNotifier {
    pub fn new(client: Client, url: Url) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, envelope: &Envelope) -> Result<()> {
        log::debug!("Posting notification to {}", self.url);
        let response = self
            .client
            .post(self.url.as_str())
            .json(envelope)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "Mail relay rejected message with status: {}",
                response.status()
            ));
        }
        log::info!("Sent \"{}\" to {}", envelope.message.subject, envelope.to.join(", "));
        Ok(())
    }
}

/// Dry run: only logs what would be sent.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, envelope: &Envelope) -> Result<()> {
        log::info!(
            "[dry-run] would send \"{}\" to {}",
            envelope.message.subject,
            envelope.to.join(", ")
        );
        log::debug!("[dry-run] body:\n{}", envelope.message.text);
        Ok(())
    }
}

/// Which sink a run delivers through.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Log,
    Smtp(SmtpSettings),
    Webhook(Url),
    Outbox(PathBuf),
}

impl Delivery {
    /// Dry run wins, then SMTP, then the HTTP relay; the outbox is the fallback.
    pub fn from_config(config: &WatcherConfig, dry_run: bool) -> Self {
        if dry_run {
            Delivery::Log
        } else if let Some(smtp) = &config.smtp {
            Delivery::Smtp(smtp.clone())
        } else if let Some(url) = &config.mail_webhook_url {
            Delivery::Webhook(url.clone())
        } else {
            Delivery::Outbox(config.outbox_dir.clone())
        }
    }

    pub fn build(self, client: &Client) -> Result<Box<dyn Notifier>> {
        Ok(match self {
            Delivery::Log => Box::new(LogNotifier),
            Delivery::Smtp(settings) => Box::new(SmtpNotifier::new(&settings)?),
            Delivery::Webhook(url) => Box::new(WebhookNotifier::new(client.clone(), url)),
            Delivery::Outbox(dir) => Box::new(OutboxNotifier::new(dir)),
        })
    }
}
