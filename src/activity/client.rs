//! Poll sources: the HTTP query API, or a provider in the same process.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::models::{EventsEnvelope, GitHubEvent, MetricEntry, MetricsEnvelope};
use super::poller::Fetch;
use super::provider::ActivityProvider;
use super::query::WindowQuery;
use crate::errors::ActivityError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for a running dashboard server's query API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ActivityError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ActivityError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &WindowQuery,
    ) -> Result<T, ActivityError> {
        let url = format!("{}{}", self.base_url, path);
        let fetch_err = |message: String| ActivityError::Fetch {
            url: url.clone(),
            message,
        };

        let resp = self
            .client
            .get(&url)
            .query(&query.to_query_pairs())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body: serde_json::Value = resp.json().await.unwrap_or_default();
            let message = body["error"]
                .as_str()
                .map(|m| format!("{} ({})", m, status))
                .unwrap_or_else(|| status.to_string());
            return Err(fetch_err(message));
        }

        resp.json::<T>()
            .await
            .map_err(|e| fetch_err(format!("invalid response body: {}", e)))
    }

    pub async fn events(&self, query: &WindowQuery) -> Result<Vec<GitHubEvent>, ActivityError> {
        let envelope: EventsEnvelope = self.get_json("/api/activity", query).await?;
        Ok(envelope.events)
    }

    pub async fn metrics(&self, query: &WindowQuery) -> Result<Vec<MetricEntry>, ActivityError> {
        let envelope: MetricsEnvelope = self.get_json("/api/metrics", query).await?;
        Ok(envelope.metrics)
    }
}

#[async_trait]
impl Fetch<Vec<GitHubEvent>> for ApiClient {
    async fn fetch(&self, query: &WindowQuery) -> Result<Vec<GitHubEvent>, ActivityError> {
        self.events(query).await
    }
}

#[async_trait]
impl Fetch<Vec<MetricEntry>> for ApiClient {
    async fn fetch(&self, query: &WindowQuery) -> Result<Vec<MetricEntry>, ActivityError> {
        self.metrics(query).await
    }
}

/// Polls a provider directly, skipping HTTP.
#[derive(Clone)]
pub struct ProviderSource {
    provider: Arc<dyn ActivityProvider>,
}

impl ProviderSource {
    pub fn new(provider: Arc<dyn ActivityProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Fetch<Vec<GitHubEvent>> for ProviderSource {
    async fn fetch(&self, query: &WindowQuery) -> Result<Vec<GitHubEvent>, ActivityError> {
        self.provider
            .query_events(query)
            .await
            .map_err(ActivityError::Provider)
    }
}

#[async_trait]
impl Fetch<Vec<MetricEntry>> for ProviderSource {
    async fn fetch(&self, query: &WindowQuery) -> Result<Vec<MetricEntry>, ActivityError> {
        self.provider
            .query_metrics(query)
            .await
            .map_err(ActivityError::Provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::provider::StaticProvider;
    use crate::activity::provider::test_support::{event, metric};
    use crate::activity::{api, api::AppState};
    use chrono::{Duration as ChronoDuration, Utc};

    async fn serve(provider: StaticProvider) -> String {
        let state = Arc::new(AppState::new(Arc::new(provider)));
        let app = api::api_router().with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_api_client_round_trip() {
        let provider = StaticProvider::new(
            vec![event("e1", "pr_merged", "acme/widgets", 42, ChronoDuration::hours(1))],
            vec![metric("triage", Utc::now() - ChronoDuration::minutes(5))],
        );
        let base = serve(provider).await;
        let client = ApiClient::new(&base).unwrap();

        let events = client.events(&WindowQuery::default()).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "e1");

        let metrics = client.metrics(&WindowQuery::default()).await.unwrap();
        assert_eq!(metrics[0].job, "triage");
    }

    #[tokio::test]
    async fn test_api_client_surfaces_error_message() {
        let base = serve(StaticProvider::default()).await;
        let client = ApiClient::new(&base).unwrap();
        // Bypass slug validation on the client side to hit the server check.
        let err = client
            .get_json::<EventsEnvelope>("/api/activity?project=bad%20slug", &WindowQuery::default())
            .await
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("Invalid project slug"), "{}", text);
    }

    #[tokio::test]
    async fn test_api_client_unreachable() {
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        let err = client.events(&WindowQuery::default()).await.unwrap_err();
        assert!(matches!(err, ActivityError::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_provider_source() {
        let provider = StaticProvider::new(
            vec![event("e1", "issue_closed", "acme/widgets", 3, ChronoDuration::hours(2))],
            Vec::new(),
        );
        let source = ProviderSource::new(Arc::new(provider));
        let query = WindowQuery::default();
        let events = <ProviderSource as Fetch<Vec<GitHubEvent>>>::fetch(&source, &query)
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        let metrics = <ProviderSource as Fetch<Vec<MetricEntry>>>::fetch(&source, &query)
            .await
            .unwrap();
        assert!(metrics.is_empty());
    }
}
