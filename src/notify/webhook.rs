use super::{truncate_content, Notifier};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::info;
use url::Url;

#[derive(Debug, Clone, Serialize)]
struct WebhookPayload {
    content: String,
}

/// Posts messages to a chat webhook; `204 No Content` is the only success
pub struct WebhookNotifier {
    client: Client,
    url: Url,
    policy: RetryPolicy,
}

impl WebhookNotifier {
    pub fn new(config: &Config) -> Result<Self> {
        let url = config.webhook_url()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url,
            policy: config.notify.policy(),
        })
    }

    async fn post_once(&self, payload: &WebhookPayload) -> Result<()> {
        let response = self
            .client
            .post(self.url.clone())
            .json(payload)
            .send()
            .await?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(()),
            status => Err(Error::Notify(format!("webhook answered {}", status))),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, text: &str) -> Result<()> {
        let payload = WebhookPayload {
            content: truncate_content(text),
        };

        self.policy
            .run("webhook post", || self.post_once(&payload), |_| true)
            .await?;
        info!("Delivered to webhook");
        Ok(())
    }
}
