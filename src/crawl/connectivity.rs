//! Network reachability gate

use crate::config::Config;
use crate::error::{Error, Result};
use futures::future::join_all;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Checks that the outside world and the webhook provider are reachable.
///
/// Any HTTP answer counts as reachable; only transport failures do not.
pub struct Connectivity {
    client: Client,
    references: Vec<String>,
    provider: String,
}

impl Connectivity {
    pub fn new(config: &Config, webhook: &Url) -> Result<Self> {
        let timeout = Duration::from_secs(config.connectivity.timeout_secs);
        let client = Client::builder()
            .user_agent(&config.http.user_agent)
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            references: config.connectivity.endpoints.clone(),
            provider: provider_origin(webhook),
        })
    }

    /// Online when at least one reference endpoint and the provider answer.
    /// An empty reference list only checks the provider.
    pub async fn check(&self) -> bool {
        let references_ok = self.references.is_empty()
            || join_all(self.references.iter().map(|url| self.reachable(url)))
                .await
                .into_iter()
                .any(|ok| ok);

        if !references_ok {
            warn!("No reference endpoint reachable");
            return false;
        }

        if !self.reachable(&self.provider).await {
            warn!("Webhook provider {} unreachable", self.provider);
            return false;
        }

        true
    }

    async fn reachable(&self, url: &str) -> bool {
        match self.client.head(url).send().await {
            Ok(response) => {
                debug!("{} answered {}", url, response.status());
                true
            }
            Err(e) => {
                debug!("{} unreachable: {}", url, e);
                false
            }
        }
    }
}

/// Scheme, host and port of the webhook, without path or secrets
pub fn provider_origin(webhook: &Url) -> String {
    format!("{}/", webhook.origin().ascii_serialization())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn closed_port_url() -> String {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        format!("http://127.0.0.1:{}/", port)
    }

    fn connectivity(references: Vec<String>, webhook: &str) -> Connectivity {
        let mut config = Config::default();
        config.connectivity.endpoints = references;
        config.connectivity.timeout_secs = 2;
        Connectivity::new(&config, &Url::parse(webhook).unwrap()).unwrap()
    }

    #[test]
    fn test_provider_origin_strips_path() {
        let url = Url::parse("https://discord.com/api/webhooks/123/secret").unwrap();
        assert_eq!(provider_origin(&url), "https://discord.com/");

        let url = Url::parse("http://127.0.0.1:8080/hook").unwrap();
        assert_eq!(provider_origin(&url), "http://127.0.0.1:8080/");
    }

    #[tokio::test]
    async fn test_online_when_any_reference_and_provider_answer() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&server)
            .await;

        let gate = connectivity(
            vec![closed_port_url(), server.uri()],
            &format!("{}/webhook", server.uri()),
        );
        assert!(gate.check().await);
    }

    #[tokio::test]
    async fn test_offline_when_provider_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let gate = connectivity(vec![server.uri()], &format!("{}hook", closed_port_url()));
        assert!(!gate.check().await);
    }

    #[tokio::test]
    async fn test_offline_when_no_reference_answers() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let gate = connectivity(vec![closed_port_url()], &format!("{}/hook", server.uri()));
        assert!(!gate.check().await);
    }
}
