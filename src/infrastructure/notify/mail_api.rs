//! Mail delivery through an HTTP mail API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::config::MailCfg;
use crate::domain::notification::{AlertMessage, Notifier};
use crate::shared::errors::{AppError, DeliveryError};

#[derive(Debug, Serialize)]
struct MailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

/// POSTs one JSON message per recipient to a transactional mail endpoint
pub struct MailApiNotifier {
    http_client: Client,
    endpoint: String,
    api_key: Option<String>,
    sender: String,
}

impl MailApiNotifier {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        sender: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::ConfigError(format!("failed to build mail client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            api_key,
            sender: sender.into(),
        })
    }

    /// API key is read from the environment variable named in the config
    pub fn from_config(cfg: &MailCfg, sender: &str) -> Result<Self, AppError> {
        let api_key = std::env::var(&cfg.api_key_env).ok().filter(|k| !k.is_empty());
        Self::new(
            cfg.endpoint.clone(),
            api_key,
            sender,
            Duration::from_secs(cfg.timeout_secs),
        )
    }
}

#[async_trait]
impl Notifier for MailApiNotifier {
    fn name(&self) -> &str {
        "mail-api"
    }

    async fn send(&self, recipient: &str, message: &AlertMessage) -> Result<(), DeliveryError> {
        let body = MailRequest {
            from: &self.sender,
            to: recipient,
            subject: &message.subject,
            html: &message.html,
            text: &message.text,
        };

        let mut request = self.http_client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DeliveryError::new(recipient, format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(DeliveryError::new(
                recipient,
                format!("mail API responded with status {}", response.status()),
            ));
        }

        info!("✅ Email sent to {}", recipient);
        Ok(())
    }
}
