//! Time-window query parameters shared by the API, provider, and poller.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::ActivityError;

/// Lookback window used when `days` is missing or not a number.
pub const DEFAULT_DAYS: u32 = 7;

static SLUG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Project identifier restricted to alphanumerics, `-` and `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProjectSlug(String);

impl ProjectSlug {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ProjectSlug {
    type Err = ActivityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if SLUG_REGEX.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(ActivityError::InvalidProjectSlug {
                value: s.to_string(),
            })
        }
    }
}

impl fmt::Display for ProjectSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Query string exactly as received. Both fields stay strings so that a bad
/// `days` value can fall back to the default instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWindowParams {
    pub days: Option<String>,
    pub project: Option<String>,
}

impl RawWindowParams {
    /// Collect parameters from decoded query pairs. The first occurrence of a
    /// repeated key wins; unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut raw = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "days" => &mut raw.days,
                "project" => &mut raw.project,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        raw
    }
}

/// A validated lookback window, optionally scoped to one project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowQuery {
    pub days: u32,
    pub project: Option<ProjectSlug>,
}

impl Default for WindowQuery {
    fn default() -> Self {
        Self {
            days: DEFAULT_DAYS,
            project: None,
        }
    }
}

impl WindowQuery {
    pub fn new(days: u32, project: Option<ProjectSlug>) -> Self {
        Self { days, project }
    }

    /// Validate raw parameters.
    ///
    /// `days` never fails: anything that does not start with an integer falls
    /// back to [`DEFAULT_DAYS`]. `project` is strict and rejects any value
    /// outside the slug alphabet. An empty `project` means all projects.
    pub fn from_raw(raw: &RawWindowParams) -> Result<Self, ActivityError> {
        let days = raw
            .days
            .as_deref()
            .and_then(parse_leading_days)
            .unwrap_or(DEFAULT_DAYS);
        let project = match raw.project.as_deref() {
            None | Some("") => None,
            Some(value) => Some(value.parse::<ProjectSlug>()?),
        };
        Ok(Self { days, project })
    }

    pub fn with_project(&self, project: Option<ProjectSlug>) -> Self {
        Self {
            days: self.days,
            project,
        }
    }

    /// Query-string pairs for re-issuing this query over HTTP.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("days", self.days.to_string())];
        if let Some(ref project) = self.project {
            pairs.push(("project", project.to_string()));
        }
        pairs
    }
}

impl fmt::Display for WindowQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.project {
            Some(project) => write!(f, "last {}d, project {}", self.days, project),
            None => write!(f, "last {}d, all projects", self.days),
        }
    }
}

/// Parse the integer prefix of `input` (`"10"`, `" 3days"`, `"2.5"` → 2).
/// Returns `None` for non-numeric or negative input.
fn parse_leading_days(input: &str) -> Option<u32> {
    let trimmed = input.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits: String = unsigned.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<u32>().ok()
}
