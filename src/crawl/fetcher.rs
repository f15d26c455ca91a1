//! Random page fetching and item extraction

use super::SiteClient;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::Item;
use crate::parse::extract_items;
use crate::retry::RetryPolicy;
use chrono::{Local, NaiveDate};
use rand::Rng;
use tracing::{debug, info, warn};

/// Fetches one random listing page of a category
pub struct Fetcher {
    client: SiteClient,
    retry: RetryPolicy,
    date_category: Option<String>,
    date_window_days: u32,
}

impl Fetcher {
    pub fn new(client: SiteClient, config: &Config) -> Self {
        Self {
            client,
            retry: config.retry.policy(),
            date_category: config.date_category.clone(),
            date_window_days: config.date_window_days,
        }
    }

    /// Pick the page to read: a random date for the date-indexed category,
    /// otherwise a random page in `[1, page_count]`.
    pub fn target_url(&self, category: &str, page_count: u32) -> String {
        let mut rng = rand::rng();
        if self.date_category.as_deref() == Some(category) {
            let days_back = rng.random_range(0..=self.date_window_days);
            self.client.date_url(date_days_back(days_back))
        } else {
            let page = rng.random_range(1..=page_count.max(1));
            self.client.category_url(category, page)
        }
    }

    /// Fetch items, retrying transient failures with backoff.
    ///
    /// Never fails: a page that cannot be read yields no items.
    pub async fn fetch(&self, category: &str, page_count: u32) -> Vec<Item> {
        let url = self.target_url(category, page_count);
        info!("Parsing: {}", url);

        match self
            .retry
            .run(
                "fetch",
                || self.fetch_url(&url, category),
                Error::is_transient,
            )
            .await
        {
            Ok(items) => items,
            Err(e) => {
                warn!(category = %category, "Failed to read {}: {}", url, e);
                Vec::new()
            }
        }
    }

    /// Single attempt; transport failures surface as transient errors
    async fn fetch_url(&self, url: &str, category: &str) -> Result<Vec<Item>> {
        let body = self.client.get_text(url).await?;
        let items = extract_items(&body, category);
        debug!("Extracted {} items from {}", items.len(), url);
        Ok(items)
    }
}

fn date_days_back(days: u32) -> NaiveDate {
    Local::now().date_naive() - chrono::Duration::days(days as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use wiremock::matchers::{method, path, path_regex};
    use std::time::Duration;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<html><body>
        <div class="anekdot-text" data-id="1"><p>A</p></div>
        <div class="anekdot-text" data-id="2"><p>B</p></div>
        <div class="anekdot-text"><p>no id</p></div>
    </body></html>"#;

    fn fetcher(base: &str) -> Fetcher {
        let mut config = Config::default();
        config.retry.base_ms = 1;
        config.retry.max_ms = 5;
        let client = SiteClient::new(base, &HttpConfig::default()).unwrap();
        Fetcher::new(client, &config)
    }

    #[test]
    fn test_target_url_page_mode_stays_in_range() {
        let fetcher = fetcher("https://anekdotovstreet.com");
        for _ in 0..200 {
            let url = fetcher.target_url("blondinki", 5);
            let tail = url
                .trim_start_matches("https://anekdotovstreet.com/blondinki/")
                .trim_end_matches('/');
            let page: u32 = if tail.is_empty() { 1 } else { tail.parse().unwrap() };
            assert!((1..=5).contains(&page), "page {} out of range", page);
        }
    }

    #[test]
    fn test_target_url_zero_pages_uses_first_page() {
        let fetcher = fetcher("https://anekdotovstreet.com");
        assert_eq!(
            fetcher.target_url("blondinki", 0),
            "https://anekdotovstreet.com/blondinki/"
        );
    }

    #[test]
    fn test_target_url_date_mode_within_window() {
        let fetcher = fetcher("https://anekdotovstreet.com");
        let today = Local::now().date_naive();
        for _ in 0..100 {
            let url = fetcher.target_url("svegie-anekdoty", 3);
            let raw = url
                .trim_start_matches("https://anekdotovstreet.com/date/")
                .trim_end_matches('/');
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap();
            let back = (today - date).num_days();
            assert!((0..=31).contains(&back), "date {} outside window", date);
        }
    }

    #[tokio::test]
    async fn test_fetch_extracts_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/blondinki/(\d+/)?$"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let items = fetcher(&server.uri()).fetch("blondinki", 5).await;
        assert_eq!(items, vec![Item::new("1", "A"), Item::new("2", "B")]);
    }

    #[tokio::test]
    async fn test_fetch_http_error_yields_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/armiya/"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        assert!(fetcher(&server.uri()).fetch("armiya", 1).await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_url_reports_status() {
        let server = MockServer::start().await;
        let url = format!("{}/armiya/", server.uri());
        let result = fetcher(&server.uri()).fetch_url(&url, "armiya").await;
        assert!(matches!(result, Err(Error::Status { .. })));
    }

    #[tokio::test]
    async fn test_fetch_retries_timeout_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/armiya/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(PAGE)
                    .set_delay(Duration::from_secs(3)),
            )
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/armiya/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = Config::default();
        config.retry.base_ms = 1;
        config.retry.max_ms = 5;
        let http = HttpConfig {
            timeout_secs: 1,
            ..HttpConfig::default()
        };
        let client = SiteClient::new(&server.uri(), &http).unwrap();
        let fetcher = Fetcher::new(client, &config);

        let items = fetcher.fetch("armiya", 1).await;
        assert_eq!(items, vec![Item::new("1", "A"), Item::new("2", "B")]);
    }
}
