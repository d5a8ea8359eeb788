// src/api.rs
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::FetchError;
use crate::models::{NewsItem, QuoteEntry};

#[derive(Deserialize)]
struct NewsResponse {
    id: i64,
    text: String,
}

/// Fetches one batched quote response for the given symbols. Never touches
/// the watch list; the scheduler merges whatever comes back.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quotes(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, QuoteEntry>, FetchError>;
}

/// Fetches the latest market-news item.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch_news(&self) -> Result<NewsItem, FetchError>;
}

pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ApiClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        ApiClient {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::Auth(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(FetchError::Network(format!("HTTP {}", status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))
    }
}

#[async_trait]
impl QuoteSource for ApiClient {
    async fn fetch_quotes(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, QuoteEntry>, FetchError> {
        if symbols.is_empty() {
            return Err(FetchError::EmptySymbolSet);
        }
        let url = format!(
            "{}/quotes?symbols={}&apikey={}",
            self.base_url,
            symbols.join(","),
            self.api_key
        );
        debug!("Fetching quotes for {} symbols", symbols.len());
        self.get_json(&url).await
    }
}

#[async_trait]
impl NewsSource for ApiClient {
    async fn fetch_news(&self) -> Result<NewsItem, FetchError> {
        let url = format!("{}/news?apikey={}", self.base_url, self.api_key);
        debug!("Fetching market news");
        let raw: NewsResponse = self.get_json(&url).await?;
        Ok(NewsItem {
            id: raw.id,
            text: raw.text,
            fetched_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_symbol_set_short_circuits_before_the_network() {
        // The port is closed; if a request were attempted this would come
        // back as a network error instead.
        let client = ApiClient::new("http://127.0.0.1:9".to_string(), "key".to_string());
        let result = client.fetch_quotes(&[]).await;
        assert!(matches!(result, Err(FetchError::EmptySymbolSet)));
    }

    #[test]
    fn quote_payload_tolerates_extra_fields() {
        let raw = r#"{
            "AAPL": {"price": 105.5, "timestamp": "2026-08-06T12:00:00Z", "volume": 12345},
            "MSFT": {"price": 412.0, "timestamp": "2026-08-06T12:00:01Z"}
        }"#;
        let parsed: HashMap<String, QuoteEntry> = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["AAPL"].price, 105.5);
    }

    #[test]
    fn quote_payload_with_wrong_shape_fails_to_decode() {
        let raw = r#"{"AAPL": {"close": "105.5"}}"#;
        let parsed: Result<HashMap<String, QuoteEntry>, _> = serde_json::from_str(raw);
        assert!(parsed.is_err());
    }

    #[test]
    fn news_payload_tolerates_extra_fields() {
        let raw = r#"{"id": 42, "text": "Markets rally", "source": "wire"}"#;
        let parsed: NewsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.id, 42);
        assert_eq!(parsed.text, "Markets rally");
    }
}
