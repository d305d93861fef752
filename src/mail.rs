use anyhow::{Context, Result};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub recipient: String,
}

/// Sends one alert email over STARTTLS. The transport is blocking, so the
/// whole exchange runs on a blocking thread.
pub async fn send_email(settings: SmtpSettings, subject: String, body: String) -> Result<()> {
    tokio::task::spawn_blocking(move || {
        let from: Mailbox = settings
            .username
            .parse()
            .context("SMTP username is not a valid sender address")?;
        let to: Mailbox = settings
            .recipient
            .parse()
            .context("recipient is not a valid address")?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .body(body)
            .context("failed to build alert message")?;

        let transport = SmtpTransport::starttls_relay(&settings.server)
            .context("failed to configure SMTP relay")?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build();

        transport
            .send(&message)
            .context("failed to send alert email")?;
        Ok(())
    })
    .await
    .context("mail task was cancelled")?
}
