//! Event/metric providers.
//!
//! The dashboard never owns the data it shows. `ActivityProvider` is the
//! seam: the API hands it a validated [`WindowQuery`] and gets back the
//! matching events and job records. Two implementations ship:
//!
//! - [`JsonlProvider`] reads the pipeline's append-only JSONL files
//! - [`StaticProvider`] serves a fixed in-memory snapshot

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;

use super::models::{GitHubEvent, MetricEntry};
use super::query::{ProjectSlug, WindowQuery};

/// Events file relative to the pipeline data directory.
pub const EVENTS_FILE: &str = "state/github-events.jsonl";
/// Job metrics file relative to the pipeline data directory.
pub const METRICS_FILE: &str = "data/metrics.jsonl";

#[async_trait]
pub trait ActivityProvider: Send + Sync {
    /// Events inside the window, newest first.
    async fn query_events(&self, query: &WindowQuery) -> Result<Vec<GitHubEvent>>;

    /// Job records inside the window, oldest first.
    async fn query_metrics(&self, query: &WindowQuery) -> Result<Vec<MetricEntry>>;
}

// ── Window filtering ──────────────────────────────────────────────────

/// Oldest timestamp inside the window. A window reaching past the
/// representable range covers all history.
fn window_start(days: u32, now: DateTime<Utc>) -> DateTime<Utc> {
    Duration::try_days(i64::from(days))
        .and_then(|span| now.checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn event_in_project(event: &GitHubEvent, project: &ProjectSlug) -> bool {
    let slug = project.as_str();
    if event.project.as_deref() == Some(slug) {
        return true;
    }
    event.repo.split('/').any(|segment| segment == slug)
}

fn metric_in_project(entry: &MetricEntry, project: &ProjectSlug) -> bool {
    let slug = project.as_str();
    entry.project.as_deref() == Some(slug)
        || entry
            .repo
            .as_deref()
            .is_some_and(|repo| repo.split('/').any(|segment| segment == slug))
}

/// Apply the window and project scope to `events`, newest first.
pub fn filter_events(
    events: impl IntoIterator<Item = GitHubEvent>,
    query: &WindowQuery,
    now: DateTime<Utc>,
) -> Vec<GitHubEvent> {
    let start = window_start(query.days, now);
    let mut selected: Vec<GitHubEvent> = events
        .into_iter()
        .filter(|e| e.timestamp >= start)
        .filter(|e| query.project.as_ref().is_none_or(|p| event_in_project(e, p)))
        .collect();
    selected.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    selected
}

/// Apply the window and project scope to `metrics`, oldest first.
pub fn filter_metrics(
    metrics: impl IntoIterator<Item = MetricEntry>,
    query: &WindowQuery,
    now: DateTime<Utc>,
) -> Vec<MetricEntry> {
    let start = window_start(query.days, now);
    let mut selected: Vec<MetricEntry> = metrics
        .into_iter()
        .filter(|m| m.timestamp >= start)
        .filter(|m| query.project.as_ref().is_none_or(|p| metric_in_project(m, p)))
        .collect();
    // Stable: records sharing a timestamp keep file order.
    selected.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    selected
}

// ── JSONL provider ────────────────────────────────────────────────────

/// Reads the pipeline's JSONL output under a data directory.
///
/// Files are re-read on every query so each poll reflects what the pipeline
/// has appended since. A missing file is an empty feed. Lines that fail to
/// parse are skipped and logged.
#[derive(Debug, Clone)]
pub struct JsonlProvider {
    data_dir: PathBuf,
}

impl JsonlProvider {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn events_path(&self) -> PathBuf {
        self.data_dir.join(EVENTS_FILE)
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.data_dir.join(METRICS_FILE)
    }
}

async fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    let mut records = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    line = idx + 1,
                    error = %e,
                    "skipping malformed record"
                );
            }
        }
    }
    Ok(records)
}

#[async_trait]
impl ActivityProvider for JsonlProvider {
    async fn query_events(&self, query: &WindowQuery) -> Result<Vec<GitHubEvent>> {
        let events = read_jsonl::<GitHubEvent>(&self.events_path()).await?;
        Ok(filter_events(events, query, Utc::now()))
    }

    async fn query_metrics(&self, query: &WindowQuery) -> Result<Vec<MetricEntry>> {
        let metrics = read_jsonl::<MetricEntry>(&self.metrics_path()).await?;
        Ok(filter_metrics(metrics, query, Utc::now()))
    }
}

// ── Static provider ───────────────────────────────────────────────────

/// Fixed snapshot, windowed against the wall clock at query time.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    events: Vec<GitHubEvent>,
    metrics: Vec<MetricEntry>,
}

impl StaticProvider {
    pub fn new(events: Vec<GitHubEvent>, metrics: Vec<MetricEntry>) -> Self {
        Self { events, metrics }
    }
}

#[async_trait]
impl ActivityProvider for StaticProvider {
    async fn query_events(&self, query: &WindowQuery) -> Result<Vec<GitHubEvent>> {
        Ok(filter_events(self.events.clone(), query, Utc::now()))
    }

    async fn query_metrics(&self, query: &WindowQuery) -> Result<Vec<MetricEntry>> {
        Ok(filter_metrics(self.metrics.clone(), query, Utc::now()))
    }
}
