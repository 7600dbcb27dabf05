use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{Envelope, Notifier};
use crate::core::config::SmtpSettings;

/// Port on which the relay expects TLS from the first byte; anything else upgrades with STARTTLS.
const IMPLICIT_TLS_PORT: u16 = 465;

/// Sends notifications straight to an SMTP relay.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
}

impl SmtpNotifier {
    pub fn new(settings: &SmtpSettings) -> Result<Self> {
        let builder = if settings.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
        }
        .with_context(|| format!("Invalid SMTP host {}", settings.host))?
        .port(settings.port);

        let builder = match &settings.credentials {
            Some((user, pass)) => builder.credentials(Credentials::new(user.clone(), pass.clone())),
            None => builder,
        };

        Ok(Self {
            transport: builder.build(),
            host: format!("{}:{}", settings.host, settings.port),
        })
    }
}

/// multipart/alternative message carrying the text and HTML bodies.
pub fn build_message(envelope: &Envelope) -> Result<Message> {
    let from: Mailbox = envelope
        .from
        .parse()
        .with_context(|| format!("Invalid sender address {:?}", envelope.from))?;
    let mut builder = Message::builder()
        .from(from)
        .subject(envelope.message.subject.as_str());
    for recipient in &envelope.to {
        let to: Mailbox = recipient
            .parse()
            .with_context(|| format!("Invalid recipient address {:?}", recipient))?;
        builder = builder.to(to);
    }

    let message = builder.multipart(MultiPart::alternative_plain_html(
        envelope.message.text.clone(),
        envelope.message.html.clone(),
    ))?;
    Ok(message)
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, envelope: &Envelope) -> Result<()> {
        let message = build_message(envelope)?;
        log::debug!("Sending notification through {}", self.host);
        self.transport
            .send(message)
            .await
            .with_context(|| format!("SMTP delivery via {} failed", self.host))?;
        log::info!("Sent \"{}\" to {}", envelope.message.subject, envelope.to.join(", "));
        Ok(())
    }
}
