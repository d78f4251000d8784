//! Pipeline jobs table: newest-first, capped.

use chrono::Local;
use console::style;

use super::models::MetricEntry;

/// Most rows the table ever shows.
pub const METRICS_DISPLAY_LIMIT: usize = 50;
/// Skeleton rows shown while the first fetch is in flight.
pub const SKELETON_ROWS: usize = 5;

/// Reverse the provider's oldest-first order and keep the newest `limit`.
pub fn latest_first(metrics: &[MetricEntry], limit: usize) -> Vec<&MetricEntry> {
    metrics.iter().rev().take(limit).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Success,
    Failed,
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub time: String,
    pub job: String,
    pub target: String,
    pub outcome: JobOutcome,
    pub status: String,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetricsView {
    Loading { skeleton_rows: usize },
    Empty,
    Rows(Vec<MetricRow>),
}

impl MetricsView {
    pub fn build(metrics: &[MetricEntry], loading: bool, limit: usize) -> Self {
        if loading {
            return Self::Loading {
                skeleton_rows: SKELETON_ROWS,
            };
        }
        if metrics.is_empty() {
            return Self::Empty;
        }
        Self::Rows(latest_first(metrics, limit).into_iter().map(row).collect())
    }

    pub fn render_lines(&self) -> Vec<String> {
        match self {
            Self::Loading { skeleton_rows } => (0..*skeleton_rows)
                .map(|_| style("  ░░░░░░░░░░░░  ░░░░░░░░░░  ░░░░░░░░░░░░░░  ░░░░░░").dim().to_string())
                .collect(),
            Self::Empty => vec![format!("  {}", style("No pipeline jobs recorded.").dim())],
            Self::Rows(rows) => {
                let mut lines = vec![
                    style(format!(
                        "  {:<12}  {:<16}  {:<28}  {:<9}  {:>8}",
                        "TIME", "JOB", "TARGET", "STATUS", "DURATION"
                    ))
                    .dim()
                    .to_string(),
                ];
                lines.extend(rows.iter().map(render_row));
                lines
            }
        }
    }
}

fn row(entry: &MetricEntry) -> MetricRow {
    let outcome = match entry.succeeded() {
        Some(true) => JobOutcome::Success,
        Some(false) => JobOutcome::Failed,
        None => JobOutcome::Unknown,
    };
    let status = entry.status.clone().unwrap_or_else(|| match outcome {
        JobOutcome::Success => "success".to_string(),
        JobOutcome::Failed => "failed".to_string(),
        JobOutcome::Unknown => "-".to_string(),
    });
    let target = match (entry.repo.as_deref(), entry.item.as_deref()) {
        (Some(repo), Some(item)) => format!("{}#{}", repo, item),
        (Some(repo), None) => repo.to_string(),
        (None, Some(item)) => format!("#{}", item),
        (None, None) => "-".to_string(),
    };
    MetricRow {
        time: entry
            .timestamp
            .with_timezone(&Local)
            .format("%b %d %H:%M")
            .to_string(),
        job: entry.job.clone(),
        target,
        outcome,
        status,
        duration: entry.duration_s.map(format_duration).unwrap_or_else(|| "-".to_string()),
    }
}

/// `41s`, `3m 20s`, `1h 02m`.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    if total < 60 {
        format!("{}s", total)
    } else if total < 3600 {
        format!("{}m {:02}s", total / 60, total % 60)
    } else {
        format!("{}h {:02}m", total / 3600, (total % 3600) / 60)
    }
}

fn render_row(row: &MetricRow) -> String {
    let status = match row.outcome {
        JobOutcome::Success => style(&row.status).green(),
        JobOutcome::Failed => style(&row.status).red(),
        JobOutcome::Unknown => style(&row.status).dim(),
    };
    format!(
        "  {:<12}  {:<16}  {:<28}  {:<9}  {:>8}",
        row.time, row.job, row.target, status, row.duration
    )
}
