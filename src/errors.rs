//! Typed error hierarchy for the activity dashboard.
//!
//! `ActivityError` covers the failures the core distinguishes between:
//! - `InvalidProjectSlug` — caller-supplied `project` failed validation (400)
//! - `Provider` — the event/metric provider failed (500, cause is logged only)
//! - `Fetch` — a poll against the query API failed on the client side
//! - `Config` — dashboard configuration could not be loaded or applied

use thiserror::Error;

/// Errors from the activity query, polling, and configuration layers.
#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("Invalid project slug '{value}'")]
    InvalidProjectSlug { value: String },

    #[error("Provider query failed: {0}")]
    Provider(#[source] anyhow::Error),

    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ActivityError {
    /// Whether the failure was caused by the caller rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidProjectSlug { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_slug_carries_value() {
        let err = ActivityError::InvalidProjectSlug {
            value: "../etc".to_string(),
        };
        match &err {
            ActivityError::InvalidProjectSlug { value } => assert_eq!(value, "../etc"),
            _ => panic!("Expected InvalidProjectSlug"),
        }
        assert!(err.to_string().contains("../etc"));
        assert!(err.is_client_error());
    }

    #[test]
    fn provider_error_keeps_source() {
        let err = ActivityError::Provider(anyhow::anyhow!("disk on fire"));
        assert!(!err.is_client_error());
        let source = std::error::Error::source(&err).expect("source should be set");
        assert_eq!(source.to_string(), "disk on fire");
    }

    #[test]
    fn fetch_error_mentions_url() {
        let err = ActivityError::Fetch {
            url: "http://localhost:8420/api/activity".to_string(),
            message: "timed out".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("/api/activity"));
        assert!(text.contains("timed out"));
    }

    #[test]
    fn converts_from_anyhow() {
        let err: ActivityError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, ActivityError::Other(_)));
    }
}
