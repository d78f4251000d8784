//! The activity view: two independent polls feeding the feed and the table.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use console::style;
use tokio::sync::watch;

use super::catalog::EventCatalog;
use super::feed::{FeedRenderer, FeedView};
use super::metrics_table::{METRICS_DISPLAY_LIMIT, MetricsView};
use super::models::{GitHubEvent, MetricEntry};
use super::poller::{Fetch, PollSnapshot, Poller};
use super::query::{DEFAULT_DAYS, ProjectSlug, WindowQuery};

#[derive(Debug, Clone)]
pub struct ViewSettings {
    pub days: u32,
    pub project: Option<ProjectSlug>,
    pub refresh_interval: Duration,
    pub github_base_url: String,
    pub metrics_limit: usize,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            days: DEFAULT_DAYS,
            project: None,
            refresh_interval: Duration::from_secs(10),
            github_base_url: "https://github.com".to_string(),
            metrics_limit: METRICS_DISPLAY_LIMIT,
        }
    }
}

/// One live view. Dropping it (or calling [`ActivityView::shutdown`])
/// cancels both polls.
pub struct ActivityView {
    settings: ViewSettings,
    catalog: Arc<EventCatalog>,
    events: Poller<Vec<GitHubEvent>>,
    metrics: Poller<Vec<MetricEntry>>,
    events_rx: watch::Receiver<PollSnapshot<Vec<GitHubEvent>>>,
    metrics_rx: watch::Receiver<PollSnapshot<Vec<MetricEntry>>>,
}

impl ActivityView {
    pub fn spawn<S>(source: Arc<S>, catalog: Arc<EventCatalog>, settings: ViewSettings) -> Self
    where
        S: Fetch<Vec<GitHubEvent>> + Fetch<Vec<MetricEntry>>,
    {
        let query = WindowQuery::new(settings.days, settings.project.clone());
        let events_source: Arc<dyn Fetch<Vec<GitHubEvent>>> = source.clone();
        let metrics_source: Arc<dyn Fetch<Vec<MetricEntry>>> = source;

        let events = Poller::spawn(
            "events",
            events_source,
            query.clone(),
            settings.refresh_interval,
        );
        let metrics = Poller::spawn("metrics", metrics_source, query, settings.refresh_interval);
        let events_rx = events.subscribe();
        let metrics_rx = metrics.subscribe();

        Self {
            settings,
            catalog,
            events,
            metrics,
            events_rx,
            metrics_rx,
        }
    }

    pub fn project(&self) -> Option<&ProjectSlug> {
        self.settings.project.as_ref()
    }

    /// Re-scope both polls. Responses still in flight for the old project
    /// are discarded.
    pub fn set_project(&mut self, project: Option<ProjectSlug>) {
        if project == self.settings.project {
            return;
        }
        self.settings.project = project.clone();
        let query = WindowQuery::new(self.settings.days, project);
        for (name, previous) in [
            (self.events.name(), self.events.query()),
            (self.metrics.name(), self.metrics.query()),
        ] {
            tracing::info!(poller = name, from = %previous, to = %query, "switching project");
        }
        self.events.set_query(query.clone());
        self.metrics.set_query(query);
    }

    /// Trigger an out-of-schedule refresh of both polls.
    pub fn refresh(&self) {
        self.events.refresh();
        self.metrics.refresh();
    }

    pub fn feed(&self, now: DateTime<Utc>) -> FeedView {
        let snapshot = self.events.snapshot();
        let events = snapshot.data();
        let renderer = FeedRenderer::new(
            &self.catalog,
            &self.settings.github_base_url,
            self.settings.days,
        );
        renderer.build(
            events.as_deref().map(Vec::as_slice).unwrap_or_default(),
            snapshot.is_loading(),
            now,
        )
    }

    pub fn metrics_table(&self) -> MetricsView {
        let snapshot = self.metrics.snapshot();
        let metrics = snapshot.data();
        MetricsView::build(
            metrics.as_deref().map(Vec::as_slice).unwrap_or_default(),
            snapshot.is_loading(),
            self.settings.metrics_limit,
        )
    }

    /// Full screen as terminal lines.
    pub fn render(&self, now: DateTime<Utc>) -> Vec<String> {
        let title = match &self.settings.project {
            Some(project) => format!("Activity - {}", project),
            None => "Activity - Zapat".to_string(),
        };
        let mut lines = vec![
            style(title).bold().to_string(),
            style(format!(
                "What Zapat has done in the last {} days",
                self.settings.days
            ))
            .dim()
            .to_string(),
            String::new(),
            style("GitHub Activity").bold().underlined().to_string(),
        ];
        if let Some(err) = self.events.snapshot().last_error {
            lines.push(stale_notice(&err));
        }
        lines.extend(self.feed(now).render_lines());

        lines.push(String::new());
        lines.push(style("Pipeline Jobs").bold().underlined().to_string());
        if let Some(err) = self.metrics.snapshot().last_error {
            lines.push(stale_notice(&err));
        }
        lines.extend(self.metrics_table().render_lines());
        lines
    }

    /// Wait until either poll applies a new snapshot. Returns `false` once
    /// both polls have stopped.
    pub async fn changed(&mut self) -> bool {
        tokio::select! {
            res = self.events_rx.changed() => res.is_ok(),
            res = self.metrics_rx.changed() => res.is_ok(),
        }
    }

    /// Tear down the view and wait for both polls to stop.
    pub async fn shutdown(self) {
        let Self {
            events, metrics, ..
        } = self;
        tokio::join!(events.shutdown(), metrics.shutdown());
    }
}

fn stale_notice(err: &str) -> String {
    style(format!("  ! refresh failed, showing last data: {}", err))
        .yellow()
        .to_string()
}
