//! Composing and delivering agenda emails.

pub mod smtp;

use lettre::message::Mailbox;

use crate::model::agenda::AgendaRecord;
use crate::model::blob::Blob;
use crate::model::config::EmailConfig;
use crate::render::{RenderOptions, render};

pub use smtp::SmtpMailer;

/// Environment variable that overrides `[email] password`
pub const PASSWORD_ENV: &str = "AGENDA_SMTP_PASSWORD";

/// Error type for mail composition and delivery
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("email is not configured: {0} is empty")]
    NotConfigured(&'static str),
    #[error("no recipients given")]
    NoRecipients,
    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("could not build message: {0}")]
    Build(String),
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// A fully rendered message, ready for a transport
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub from: Mailbox,
    pub to: Vec<Mailbox>,
    pub subject: String,
    pub plain: String,
    pub html: String,
    pub attachments: Vec<Blob>,
}

/// Something that can deliver an [`OutgoingMail`]
pub trait MailTransport {
    fn deliver(&self, mail: &OutgoingMail) -> Result<(), TransportError>;
}

pub fn default_subject(record: &AgendaRecord) -> String {
    format!(
        "Meeting Agenda: {} - {}",
        record.topic,
        record.date.format("%Y-%m-%d")
    )
}

/// The config with `AGENDA_SMTP_PASSWORD` applied, if it is set.
pub fn with_env_password(config: &EmailConfig) -> EmailConfig {
    let mut config = config.clone();
    if let Ok(password) = std::env::var(PASSWORD_ENV)
        && !password.is_empty()
    {
        config.password = password;
    }
    config
}

/// Reject a config with any blank transport field.
pub fn check_config(config: &EmailConfig) -> Result<(), TransportError> {
    if config.smtp_host.trim().is_empty() {
        return Err(TransportError::NotConfigured("smtp_host"));
    }
    if config.smtp_port == 0 {
        return Err(TransportError::NotConfigured("smtp_port"));
    }
    if config.sender.trim().is_empty() {
        return Err(TransportError::NotConfigured("sender"));
    }
    if config.password.is_empty() {
        return Err(TransportError::NotConfigured("password"));
    }
    Ok(())
}

pub fn parse_address(address: &str) -> Result<Mailbox, TransportError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|e| TransportError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

/// Render `record` into a message. No I/O.
pub fn compose(
    record: &AgendaRecord,
    recipients: &[String],
    subject: Option<&str>,
    options: &RenderOptions,
    config: &EmailConfig,
) -> Result<OutgoingMail, TransportError> {
    check_config(config)?;
    let to: Vec<Mailbox> = recipients
        .iter()
        .filter(|r| !r.trim().is_empty())
        .map(|r| parse_address(r))
        .collect::<Result<_, _>>()?;
    if to.is_empty() {
        return Err(TransportError::NoRecipients);
    }
    let from = parse_address(&config.sender)?;

    let rendered = render(record, options);
    let subject = match subject.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => default_subject(record),
    };
    Ok(OutgoingMail {
        from,
        to,
        subject,
        plain: rendered.plain_text,
        html: rendered.html,
        attachments: record.attachments.clone(),
    })
}

/// Compose and hand the message to `transport`. Configuration and
/// recipients are checked before the transport is touched. Returns the
/// number of addresses the message went to.
pub fn send(
    record: &AgendaRecord,
    recipients: &[String],
    subject: Option<&str>,
    options: &RenderOptions,
    config: &EmailConfig,
    transport: &dyn MailTransport,
) -> Result<usize, TransportError> {
    let mail = compose(record, recipients, subject, options, config)?;
    transport.deliver(&mail)?;
    tracing::info!(
        agenda = %record.id,
        recipients = mail.to.len(),
        subject = %mail.subject,
        "sent agenda email"
    );
    Ok(mail.to.len())
}
