//! Event classification: type code → display label and category.
//!
//! The catalog is built once at startup (built-in table plus any
//! `[event_types]` overrides from `dashboard.toml`) and shared read-only.
//! Unknown codes are not an error: they render with their raw code as the
//! label and the [`Category::Neutral`] category.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{EventKind, GitHubEvent};

/// Visual category of an event badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Blue,
    Purple,
    Amber,
    Green,
    Zinc,
    Indigo,
    Neutral,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::Amber => "amber",
            Self::Green => "green",
            Self::Zinc => "zinc",
            Self::Indigo => "indigo",
            Self::Neutral => "neutral",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "blue" => Ok(Self::Blue),
            "purple" => Ok(Self::Purple),
            "amber" => Ok(Self::Amber),
            "green" => Ok(Self::Green),
            "zinc" => Ok(Self::Zinc),
            "indigo" => Ok(Self::Indigo),
            "neutral" => Ok(Self::Neutral),
            _ => Err(format!("Invalid category: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStyle {
    pub label: String,
    pub category: Category,
}

impl EventStyle {
    pub fn new(label: impl Into<String>, category: Category) -> Self {
        Self {
            label: label.into(),
            category,
        }
    }
}

/// Immutable `type → style` lookup.
#[derive(Debug, Clone)]
pub struct EventCatalog {
    styles: HashMap<String, EventStyle>,
}

impl Default for EventCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl EventCatalog {
    /// The pipeline's own event codes.
    pub fn builtin() -> Self {
        let entries = [
            (EventKind::PrCreated, "PR Created", Category::Blue),
            (EventKind::PrMerged, "PR Merged", Category::Purple),
            (EventKind::PrReviewed, "PR Reviewed", Category::Amber),
            (EventKind::PrApproved, "PR Approved", Category::Green),
            (EventKind::IssueTriaged, "Triaged", Category::Zinc),
            (EventKind::IssueResearched, "Researched", Category::Indigo),
            (EventKind::IssueClosed, "Issue Closed", Category::Green),
        ];
        let styles = entries
            .into_iter()
            .map(|(kind, label, category)| (kind.to_string(), EventStyle::new(label, category)))
            .collect();
        Self { styles }
    }

    /// Built-in table extended (or overridden) by configured entries.
    pub fn with_overrides<I>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (String, EventStyle)>,
    {
        let mut catalog = Self::builtin();
        catalog.styles.extend(overrides);
        catalog
    }

    /// Style for `kind`. Never fails: unknown codes get their raw code as
    /// label and the neutral category.
    pub fn style_for(&self, kind: &EventKind) -> EventStyle {
        self.styles
            .get(kind.as_str())
            .cloned()
            .unwrap_or_else(|| EventStyle::new(kind.as_str(), Category::Neutral))
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Entries sorted by type code.
    pub fn entries(&self) -> Vec<(&str, &EventStyle)> {
        let mut entries: Vec<(&str, &EventStyle)> =
            self.styles.iter().map(|(k, v)| (k.as_str(), v)).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

/// Relative age of `timestamp` at `now`.
///
/// Three tiers, each by truncating division: under an hour in minutes, under
/// a day in hours, otherwise days. Timestamps in the future read as `0m ago`.
pub fn time_ago(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let mins = (now - timestamp).num_minutes().max(0);
    if mins < 60 {
        return format!("{}m ago", mins);
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    format!("{}d ago", hours / 24)
}

/// Detail page for the event's PR or issue.
pub fn item_url(base_url: &str, event: &GitHubEvent) -> String {
    format!(
        "{}/{}/{}/{}",
        base_url.trim_end_matches('/'),
        event.repo,
        event.item_kind().path_segment(),
        event.number
    )
}

/// Repository page for the event's repo.
pub fn repo_url(base_url: &str, event: &GitHubEvent) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), event.repo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::provider::test_support::event;
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, h, m, 0).unwrap()
    }

    #[test]
    fn test_builtin_labels() {
        let catalog = EventCatalog::builtin();
        assert_eq!(catalog.len(), 7);
        assert_eq!(
            catalog.style_for(&EventKind::PrMerged),
            EventStyle::new("PR Merged", Category::Purple)
        );
        assert_eq!(catalog.style_for(&EventKind::IssueTriaged).label, "Triaged");
        assert_eq!(
            catalog.style_for(&EventKind::IssueClosed).category,
            Category::Green
        );
    }

    #[test]
    fn test_unknown_kind_falls_back() {
        let catalog = EventCatalog::builtin();
        let kind = EventKind::from("custom_step");
        let style = catalog.style_for(&kind);
        assert_eq!(style.label, "custom_step");
        assert_eq!(style.category, Category::Neutral);
    }

    #[test]
    fn test_overrides_extend_and_replace() {
        let catalog = EventCatalog::with_overrides(vec![
            (
                "custom_step".to_string(),
                EventStyle::new("Custom Step", Category::Indigo),
            ),
            (
                "pr_merged".to_string(),
                EventStyle::new("Shipped", Category::Green),
            ),
        ]);
        assert_eq!(catalog.len(), 8);
        assert_eq!(
            catalog.style_for(&EventKind::from("custom_step")).label,
            "Custom Step"
        );
        assert_eq!(catalog.style_for(&EventKind::PrMerged).label, "Shipped");
    }

    #[test]
    fn test_time_ago_tiers() {
        let now = at(12, 0);
        assert_eq!(time_ago(now, now), "0m ago");
        assert_eq!(time_ago(now - Duration::seconds(59), now), "0m ago");
        assert_eq!(time_ago(now - Duration::minutes(59), now), "59m ago");
        assert_eq!(time_ago(now - Duration::minutes(60), now), "1h ago");
        assert_eq!(time_ago(now - Duration::minutes(119), now), "1h ago");
        assert_eq!(time_ago(now - Duration::hours(23) - Duration::minutes(59), now), "23h ago");
        assert_eq!(time_ago(now - Duration::hours(24), now), "1d ago");
        assert_eq!(time_ago(now - Duration::hours(47), now), "1d ago");
        assert_eq!(time_ago(now - Duration::days(9), now), "9d ago");
    }

    #[test]
    fn test_time_ago_future_is_zero() {
        let now = at(12, 0);
        assert_eq!(time_ago(now + Duration::minutes(5), now), "0m ago");
    }

    #[test]
    fn test_time_ago_monotonic() {
        let now = at(12, 0);
        let mut last_minutes = 0;
        for m in 0..(3 * 24 * 60) {
            let rendered = time_ago(now - Duration::minutes(m), now);
            let trimmed = rendered.trim_end_matches(" ago");
            let (value, unit) = trimmed.split_at(trimmed.len() - 1);
            let value: i64 = value.parse().unwrap();
            let as_minutes = match unit {
                "m" => value,
                "h" => value * 60,
                "d" => value * 24 * 60,
                _ => panic!("unexpected unit in {}", rendered),
            };
            assert!(as_minutes >= last_minutes, "{} regressed", rendered);
            last_minutes = as_minutes;
        }
    }

    #[test]
    fn test_item_url_uses_prefix_rule() {
        let merged = event("1", "pr_merged", "acme/widgets", 42, Duration::zero());
        let closed = event("2", "issue_closed", "acme/widgets", 42, Duration::zero());
        assert_eq!(
            item_url("https://github.com", &merged),
            "https://github.com/acme/widgets/pull/42"
        );
        assert_eq!(
            item_url("https://github.com/", &closed),
            "https://github.com/acme/widgets/issues/42"
        );
        assert_eq!(
            repo_url("https://github.com", &merged),
            "https://github.com/acme/widgets"
        );
    }
}
