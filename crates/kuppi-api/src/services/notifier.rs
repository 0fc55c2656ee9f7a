//! Outbound email delivery.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use kuppi_core::{Error, Notifier, Result};

use crate::config::MailConfig;

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// Sends mail through an HTTP relay that accepts `{from,to,subject,html}`.
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    from: String,
}

impl HttpMailer {
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        from: String,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create mail client: {}", e)))?;
        Ok(Self {
            client,
            api_url,
            api_key,
            from,
        })
    }
}

#[async_trait]
impl Notifier for HttpMailer {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<()> {
        let start = Instant::now();
        let mut request = self.client.post(&self.api_url).json(&RelayMessage {
            from: &self.from,
            to: recipient,
            subject,
            html: html_body,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::NotificationFailed(format!("Mail relay unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                subsystem = "mail",
                component = "http_mailer",
                op = "send",
                status = status.as_u16(),
                "Mail relay rejected message"
            );
            return Err(Error::NotificationFailed(format!(
                "Mail relay returned {}: {}",
                status, body
            )));
        }

        debug!(
            subsystem = "mail",
            component = "http_mailer",
            op = "send",
            duration_ms = start.elapsed().as_millis() as u64,
            "Message accepted by relay"
        );
        Ok(())
    }
}

/// Stand-in used when no relay is configured. Every send fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn send(&self, _recipient: &str, _subject: &str, _html_body: &str) -> Result<()> {
        Err(Error::NotificationFailed(
            "Mail delivery is not configured".to_string(),
        ))
    }
}

/// A message captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub recipient: String,
    pub subject: String,
    pub html: String,
}

/// Keeps every message in memory; can be switched to fail.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMessage>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn last_to(&self, recipient: &str) -> Option<SentMessage> {
        self.sent()
            .into_iter()
            .rev()
            .find(|m| m.recipient == recipient)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::NotificationFailed("recording notifier set to fail".into()));
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(SentMessage {
                recipient: recipient.to_string(),
                subject: subject.to_string(),
                html: html_body.to_string(),
            });
        Ok(())
    }
}

/// Build the notifier described by the mail configuration.
pub fn notifier_from_config(config: &MailConfig) -> Result<Arc<dyn Notifier>> {
    match &config.api_url {
        Some(url) => {
            let from = config
                .from
                .clone()
                .ok_or_else(|| Error::Config("MAIL_FROM is required with MAIL_API_URL".into()))?;
            Ok(Arc::new(HttpMailer::new(
                url.clone(),
                config.api_key.clone(),
                from,
                config.timeout_secs,
            )?))
        }
        None => {
            warn!(
                subsystem = "mail",
                "MAIL_API_URL is not set; OTP emails will fail to send"
            );
            Ok(Arc::new(DisabledNotifier))
        }
    }
}
