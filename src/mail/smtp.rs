use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::mail::{MailTransport, OutgoingMail, TransportError, check_config};
use crate::model::blob::Blob;
use crate::model::config::EmailConfig;

/// Delivers over SMTP with STARTTLS, authenticating as the sender.
#[derive(Clone)]
pub struct SmtpMailer {
    host: String,
    port: u16,
    credentials: Credentials,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

impl SmtpMailer {
    pub fn from_config(config: &EmailConfig) -> Result<Self, TransportError> {
        check_config(config)?;
        Ok(SmtpMailer {
            host: config.smtp_host.trim().to_string(),
            port: config.smtp_port,
            credentials: Credentials::new(
                config.sender.trim().to_string(),
                config.password.clone(),
            ),
        })
    }

    fn transport(&self) -> Result<SmtpTransport, TransportError> {
        let transport = SmtpTransport::starttls_relay(&self.host)
            .map_err(|e| TransportError::Build(format!("SMTP setup failed: {}", e)))?
            .port(self.port)
            .credentials(self.credentials.clone())
            .build();
        Ok(transport)
    }
}

impl MailTransport for SmtpMailer {
    fn deliver(&self, mail: &OutgoingMail) -> Result<(), TransportError> {
        let message = to_message(mail)?;
        tracing::debug!(host = %self.host, port = self.port, "connecting to SMTP relay");
        self.transport()?
            .send(&message)
            .map_err(|e| TransportError::Delivery(e.to_string()))?;
        Ok(())
    }
}

/// Build the MIME message: a `multipart/mixed` holding the
/// plain/HTML alternative followed by any attachments.
pub fn to_message(mail: &OutgoingMail) -> Result<Message, TransportError> {
    let mut builder = Message::builder()
        .from(mail.from.clone())
        .subject(mail.subject.clone());
    for recipient in &mail.to {
        builder = builder.to(recipient.clone());
    }

    let mut body = MultiPart::mixed().multipart(MultiPart::alternative_plain_html(
        mail.plain.clone(),
        mail.html.clone(),
    ));
    for blob in &mail.attachments {
        body = body.singlepart(attachment(blob)?);
    }

    builder
        .multipart(body)
        .map_err(|e| TransportError::Build(e.to_string()))
}

fn attachment(blob: &Blob) -> Result<SinglePart, TransportError> {
    let content_type = ContentType::parse(&blob.mime_type)
        .or_else(|_| ContentType::parse("application/octet-stream"))
        .map_err(|e| TransportError::Build(e.to_string()))?;
    Ok(Attachment::new(blob.name.clone()).body(blob.data.clone(), content_type))
}
