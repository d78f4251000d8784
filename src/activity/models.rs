use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Raw event type code as emitted by the pipeline.
///
/// The known codes get their own variants; anything else is carried verbatim
/// in `Other` so newer pipeline versions never break deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    PrCreated,
    PrMerged,
    PrReviewed,
    PrApproved,
    IssueTriaged,
    IssueResearched,
    IssueClosed,
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::PrCreated => "pr_created",
            Self::PrMerged => "pr_merged",
            Self::PrReviewed => "pr_reviewed",
            Self::PrApproved => "pr_approved",
            Self::IssueTriaged => "issue_triaged",
            Self::IssueResearched => "issue_researched",
            Self::IssueClosed => "issue_closed",
            Self::Other(raw) => raw,
        }
    }

    /// Which kind of GitHub item this event refers to. Derived from the code
    /// prefix alone: `pr_*` is a pull request, everything else an issue.
    pub fn item_kind(&self) -> ItemKind {
        if self.as_str().starts_with("pr_") {
            ItemKind::PullRequest
        } else {
            ItemKind::Issue
        }
    }
}

impl From<String> for EventKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pr_created" => Self::PrCreated,
            "pr_merged" => Self::PrMerged,
            "pr_reviewed" => Self::PrReviewed,
            "pr_approved" => Self::PrApproved,
            "issue_triaged" => Self::IssueTriaged,
            "issue_researched" => Self::IssueResearched,
            "issue_closed" => Self::IssueClosed,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for EventKind {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    PullRequest,
    Issue,
}

impl ItemKind {
    /// Path segment GitHub uses for the item's detail page.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::PullRequest => "pull",
            Self::Issue => "issues",
        }
    }
}

/// A PR/issue lifecycle action performed by the pipeline agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GitHubEvent {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// `owner/name` of the source repository.
    pub repo: String,
    pub number: u64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl GitHubEvent {
    /// Repository name without the owner (`acme/widgets` → `widgets`).
    pub fn repo_short(&self) -> &str {
        self.repo.rsplit('/').next().unwrap_or(&self.repo)
    }

    pub fn item_kind(&self) -> ItemKind {
        self.kind.item_kind()
    }
}

/// One pipeline job execution. Fields the dashboard does not know about are
/// kept in `extra` so the record survives the API round trip unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricEntry {
    pub timestamp: DateTime<Utc>,
    pub job: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MetricEntry {
    /// Whether the job finished successfully. An explicit `status` wins over
    /// the exit code; a record with neither is treated as unknown.
    pub fn succeeded(&self) -> Option<bool> {
        match self.status.as_deref() {
            Some("success") | Some("ok") | Some("completed") => Some(true),
            Some("failure") | Some("failed") | Some("error") | Some("timeout") => Some(false),
            _ => self.exit_code.map(|code| code == 0),
        }
    }
}

// ── Response envelopes ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EventsEnvelope {
    pub events: Vec<GitHubEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetricsEnvelope {
    pub metrics: Vec<MetricEntry>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
