use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};

use super::models::{EventsEnvelope, MetricsEnvelope};
use super::provider::ActivityProvider;
use super::query::{RawWindowParams, WindowQuery};
use crate::errors::ActivityError;

/// Every query response reflects current state; nothing may be cached.
const NO_STORE: &str = "no-store, max-age=0";

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub provider: Arc<dyn ActivityProvider>,
}

impl AppState {
    pub fn new(provider: Arc<dyn ActivityProvider>) -> Self {
        Self { provider }
    }
}

pub type SharedState = Arc<AppState>;

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (
            status,
            [(header::CACHE_CONTROL, NO_STORE)],
            Json(serde_json::json!({"error": message})),
        )
            .into_response()
    }
}

impl From<ActivityError> for ApiError {
    fn from(err: ActivityError) -> Self {
        if err.is_client_error() {
            return ApiError::BadRequest("Invalid project slug".to_string());
        }
        // The cause stays in the server log; callers get a generic message.
        tracing::error!(error = ?err, "activity query failed");
        ApiError::Internal("Internal server error".to_string())
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/activity", get(get_activity))
        .route("/api/metrics", get(get_metrics))
        .route("/health", get(health_check))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn get_activity(
    State(state): State<SharedState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, ApiError> {
    let query = WindowQuery::from_raw(&RawWindowParams::from_pairs(pairs))?;
    let events = state
        .provider
        .query_events(&query)
        .await
        .map_err(ActivityError::Provider)?;
    tracing::debug!(%query, count = events.len(), "served activity");
    Ok((
        [(header::CACHE_CONTROL, NO_STORE)],
        Json(EventsEnvelope { events }),
    ))
}

async fn get_metrics(
    State(state): State<SharedState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, ApiError> {
    let query = WindowQuery::from_raw(&RawWindowParams::from_pairs(pairs))?;
    let metrics = state
        .provider
        .query_metrics(&query)
        .await
        .map_err(ActivityError::Provider)?;
    tracing::debug!(%query, count = metrics.len(), "served metrics");
    Ok((
        [(header::CACHE_CONTROL, NO_STORE)],
        Json(MetricsEnvelope { metrics }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::models::{GitHubEvent, MetricEntry};
    use crate::activity::provider::StaticProvider;
    use crate::activity::provider::test_support::{event, metric};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{Duration, Utc};
    use http_body_util::BodyExt;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    /// Records every query it receives; optionally fails.
    #[derive(Default)]
    struct RecordingProvider {
        calls: AtomicUsize,
        queries: Mutex<Vec<WindowQuery>>,
        fail: bool,
    }

    #[async_trait]
    impl ActivityProvider for RecordingProvider {
        async fn query_events(&self, query: &WindowQuery) -> anyhow::Result<Vec<GitHubEvent>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(query.clone());
            if self.fail {
                anyhow::bail!("sqlite: no such table github_events");
            }
            Ok(Vec::new())
        }

        async fn query_metrics(&self, query: &WindowQuery) -> anyhow::Result<Vec<MetricEntry>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(query.clone());
            if self.fail {
                anyhow::bail!("metrics file locked");
            }
            Ok(Vec::new())
        }
    }

    fn test_app(provider: Arc<dyn ActivityProvider>) -> Router {
        api_router().with_state(Arc::new(AppState::new(provider)))
    }

    async fn get(app: Router, uri: &str) -> Response {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        app.oneshot(request).await.unwrap()
    }

    async fn body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = test_app(Arc::new(StaticProvider::default()));
        let response = get(app, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_activity_envelope() {
        let provider = StaticProvider::new(
            vec![
                event("e1", "pr_merged", "acme/widgets", 42, Duration::hours(1)),
                event("e2", "custom_step", "acme/widgets", 43, Duration::hours(2)),
            ],
            Vec::new(),
        );
        let response = get(test_app(Arc::new(provider)), "/api/activity").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            NO_STORE
        );

        let json = body_json(response.into_body()).await;
        let events = json["events"].as_array().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["id"], "e1");
        assert_eq!(events[0]["type"], "pr_merged");
        assert_eq!(events[1]["type"], "custom_step");
    }

    #[tokio::test]
    async fn test_metrics_envelope() {
        let now = Utc::now();
        let provider = StaticProvider::new(
            Vec::new(),
            vec![
                metric("triage", now - Duration::hours(2)),
                metric("implement", now - Duration::hours(1)),
            ],
        );
        let response = get(test_app(Arc::new(provider)), "/api/metrics?days=1").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response.into_body()).await;
        let metrics = json["metrics"].as_array().unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0]["job"], "triage");
        assert_eq!(metrics[1]["job"], "implement");
    }

    #[tokio::test]
    async fn test_valid_slugs_reach_provider() {
        for slug in ["zapat", "my-proj", "my_proj", "A1"] {
            let provider = Arc::new(RecordingProvider::default());
            let uri = format!("/api/activity?project={}", slug);
            let response = get(test_app(provider.clone()), &uri).await;
            assert_eq!(response.status(), StatusCode::OK, "{}", slug);
            assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
            let queries = provider.queries.lock().unwrap();
            assert_eq!(queries[0].project.as_ref().unwrap().as_str(), slug);
        }
    }

    #[tokio::test]
    async fn test_invalid_slugs_never_reach_provider() {
        for encoded in ["..%2Fetc", "a%20b", "a;b", "x.y", "%C3%BC"] {
            for path in ["/api/activity", "/api/metrics"] {
                let provider = Arc::new(RecordingProvider::default());
                let uri = format!("{}?project={}", path, encoded);
                let response = get(test_app(provider.clone()), &uri).await;
                assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
                assert_eq!(provider.calls.load(Ordering::SeqCst), 0, "{}", uri);

                let json = body_json(response.into_body()).await;
                assert_eq!(json["error"], "Invalid project slug");
            }
        }
    }

    #[tokio::test]
    async fn test_bad_days_behaves_like_default() {
        for uri in ["/api/activity", "/api/activity?days=abc", "/api/activity?days=7"] {
            let provider = Arc::new(RecordingProvider::default());
            let response = get(test_app(provider.clone()), uri).await;
            assert_eq!(response.status(), StatusCode::OK);
            let queries = provider.queries.lock().unwrap();
            assert_eq!(queries[0], WindowQuery::default(), "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_bad_days_with_bad_project_still_rejected() {
        let provider = Arc::new(RecordingProvider::default());
        let response = get(test_app(provider.clone()), "/api/activity?days=abc&project=a%2Fb").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_is_generic_500() {
        let provider = Arc::new(RecordingProvider {
            fail: true,
            ..Default::default()
        });
        for path in ["/api/activity", "/api/metrics"] {
            let response = get(test_app(provider.clone()), path).await;
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(
                response.headers().get(header::CACHE_CONTROL).unwrap(),
                NO_STORE
            );

            let json = body_json(response.into_body()).await;
            assert_eq!(json, serde_json::json!({"error": "Internal server error"}));
        }
    }

    #[tokio::test]
    async fn test_repeated_days_uses_first_value() {
        let provider = Arc::new(RecordingProvider::default());
        let response = get(test_app(provider.clone()), "/api/activity?days=7&days=abc").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(provider.queries.lock().unwrap()[0], WindowQuery::default());

        let provider = Arc::new(RecordingProvider::default());
        let response = get(
            test_app(provider.clone()),
            "/api/metrics?days=3&project=zapat&project=..%2Fetc",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let queries = provider.queries.lock().unwrap();
        assert_eq!(queries[0].days, 3);
        assert_eq!(queries[0].project.as_ref().unwrap().as_str(), "zapat");
    }

    #[tokio::test]
    async fn test_huge_days_returns_ok() {
        let provider = StaticProvider::new(
            vec![event("e1", "pr_merged", "acme/widgets", 42, Duration::days(400))],
            vec![metric("triage", Utc::now() - Duration::days(400))],
        );
        let app = test_app(Arc::new(provider));
        for (path, key) in [("/api/activity", "events"), ("/api/metrics", "metrics")] {
            let uri = format!("{}?days=999999999", path);
            let response = get(app.clone(), &uri).await;
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
            let json = body_json(response.into_body()).await;
            assert_eq!(json[key].as_array().unwrap().len(), 1, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_empty_project_means_all() {
        let provider = Arc::new(RecordingProvider::default());
        let response = get(test_app(provider.clone()), "/api/activity?project=").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(provider.queries.lock().unwrap()[0].project.is_none());
    }
}
