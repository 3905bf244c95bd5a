//! Asynchronous mail notifier.
//!
//! Request handlers only enqueue; a background worker owns the provider
//! call. Delivery failures are logged and dropped so a flaky mail API can
//! never block or fail an order response.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::sync::mpsc;

const PROVIDER_URL: &str = "https://api.sendgrid.com/v3/mail/send";
const QUEUE_CAPACITY: usize = 64;

/// Mail provider configuration.
#[derive(Debug, Clone, Default)]
pub struct MailConfig {
    pub api_key: Option<String>,
    pub sender: Option<String>,
}

/// A PDF attachment for an outgoing mail.
#[derive(Debug, Clone)]
pub struct MailAttachment {
    pub filename: String,
    pub content: Vec<u8>,
}

/// One queued notification.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub subject: String,
    pub body: String,
    /// Defaults to the configured sender address when absent (internal
    /// notifications such as newsletter sign-ups).
    pub recipient: Option<String>,
    pub attachment: Option<MailAttachment>,
}

/// Handle for enqueuing notifications.
#[derive(Clone)]
pub struct Mailer {
    tx: mpsc::Sender<OutgoingMail>,
}

impl Mailer {
    /// Builds the HTTP client and spawns the delivery worker.
    pub fn spawn(config: MailConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;
        let (tx, mut rx) = mpsc::channel::<OutgoingMail>(QUEUE_CAPACITY);

        tokio::spawn(async move {
            while let Some(mail) = rx.recv().await {
                if let Err(err) = deliver(&client, &config, mail).await {
                    tracing::error!(error = %err, "mail delivery failed");
                }
            }
        });

        Ok(Self { tx })
    }

    /// Queues a notification. Never blocks; a full queue drops the mail
    /// with a log line.
    pub fn enqueue(&self, mail: OutgoingMail) {
        if let Err(err) = self.tx.try_send(mail) {
            tracing::error!(error = %err, "mail queue full, dropping notification");
        }
    }
}

async fn deliver(
    client: &reqwest::Client,
    config: &MailConfig,
    mail: OutgoingMail,
) -> Result<(), reqwest::Error> {
    let (Some(api_key), Some(sender)) = (&config.api_key, &config.sender) else {
        tracing::warn!(subject = %mail.subject, "mail provider not configured, dropping");
        return Ok(());
    };

    let recipient = mail.recipient.as_deref().unwrap_or(sender);
    let mut body = serde_json::json!({
        "personalizations": [{"to": [{"email": recipient}]}],
        "from": {"email": sender},
        "subject": mail.subject,
        "content": [{"type": "text/plain", "value": mail.body}],
    });

    if let Some(attachment) = mail.attachment {
        body["attachments"] = serde_json::json!([{
            "content": STANDARD.encode(&attachment.content),
            "filename": attachment.filename,
            "type": "application/pdf",
            "disposition": "attachment",
        }]);
    }

    client
        .post(PROVIDER_URL)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await?
        .error_for_status()?;

    tracing::info!(recipient, "mail delivered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_provider_drops_mail_silently() {
        let client = reqwest::Client::new();
        let result = deliver(
            &client,
            &MailConfig::default(),
            OutgoingMail {
                subject: "Test".into(),
                body: "Hallo".into(),
                recipient: None,
                attachment: None,
            },
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_enqueue_never_blocks() {
        let mailer = Mailer::spawn(MailConfig::default()).unwrap();
        for _ in 0..200 {
            mailer.enqueue(OutgoingMail {
                subject: "Test".into(),
                body: "Hallo".into(),
                recipient: None,
                attachment: None,
            });
        }
    }
}
