//! GitHub activity feed: classified, time-rendered event rows.

use chrono::{DateTime, Utc};
use console::{Style, style};

use super::catalog::{Category, EventCatalog, item_url, repo_url, time_ago};
use super::models::GitHubEvent;

/// Placeholder rows shown while the first fetch is in flight.
pub const PLACEHOLDER_ROWS: usize = 5;

/// One rendered event, keyed by the event id.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    pub id: String,
    pub label: String,
    pub category: Category,
    pub title: String,
    pub summary: Option<String>,
    pub url: String,
    pub repo_short: String,
    pub repo_url: String,
    pub number: u64,
    pub item_url: String,
    pub age: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedView {
    /// First fetch still running.
    Loading { placeholders: usize },
    /// Fetch completed and returned nothing.
    Empty { message: String },
    Events(Vec<EventRow>),
}

/// Turns raw events into a [`FeedView`].
pub struct FeedRenderer<'a> {
    catalog: &'a EventCatalog,
    github_base_url: &'a str,
    days: u32,
}

impl<'a> FeedRenderer<'a> {
    pub fn new(catalog: &'a EventCatalog, github_base_url: &'a str, days: u32) -> Self {
        Self {
            catalog,
            github_base_url,
            days,
        }
    }

    pub fn empty_message(&self) -> String {
        format!("No GitHub activity found in the last {} days.", self.days)
    }

    /// Build the feed. `loading` wins over an empty list so that "not yet
    /// fetched" never reads as "nothing happened".
    pub fn build(&self, events: &[GitHubEvent], loading: bool, now: DateTime<Utc>) -> FeedView {
        if loading {
            return FeedView::Loading {
                placeholders: PLACEHOLDER_ROWS,
            };
        }
        if events.is_empty() {
            return FeedView::Empty {
                message: self.empty_message(),
            };
        }
        FeedView::Events(events.iter().map(|e| self.row(e, now)).collect())
    }

    pub fn row(&self, event: &GitHubEvent, now: DateTime<Utc>) -> EventRow {
        let style = self.catalog.style_for(&event.kind);
        EventRow {
            id: event.id.clone(),
            label: style.label,
            category: style.category,
            title: event.title.clone(),
            summary: event.summary.clone().filter(|s| !s.is_empty()),
            url: event.url.clone(),
            repo_short: event.repo_short().to_string(),
            repo_url: repo_url(self.github_base_url, event),
            number: event.number,
            item_url: item_url(self.github_base_url, event),
            age: time_ago(event.timestamp, now),
        }
    }
}

pub(crate) fn category_style(category: Category) -> Style {
    match category {
        Category::Blue => Style::new().blue(),
        Category::Purple => Style::new().magenta(),
        Category::Amber => Style::new().yellow(),
        Category::Green => Style::new().green(),
        Category::Zinc => Style::new().white(),
        Category::Indigo => Style::new().cyan(),
        Category::Neutral => Style::new().dim(),
    }
}

impl FeedView {
    /// Terminal lines for this view.
    pub fn render_lines(&self) -> Vec<String> {
        match self {
            FeedView::Loading { placeholders } => (0..*placeholders)
                .map(|_| style("  ░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░").dim().to_string())
                .collect(),
            FeedView::Empty { message } => vec![format!("  {}", style(message).dim())],
            FeedView::Events(rows) => rows.iter().flat_map(render_row).collect(),
        }
    }
}

fn render_row(row: &EventRow) -> Vec<String> {
    let badge = category_style(row.category)
        .bold()
        .apply_to(format!("[{}]", row.label));
    let mut lines = vec![format!("  {} {}", badge, style(&row.title).bold())];
    if let Some(ref summary) = row.summary {
        lines.push(format!("      {}", style(summary).dim()));
    }
    lines.push(format!(
        "      {} · #{} · {}  {}",
        row.repo_short,
        row.number,
        row.age,
        style(&row.item_url).dim().underlined()
    ));
    lines
}
