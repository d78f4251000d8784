//! Activity dashboard — query API and live view over the pipeline's output.
//!
//! ## Overview
//!
//! The Zapat pipeline records two feeds while it works: GitHub lifecycle
//! events (PRs opened, merged, reviewed; issues triaged, researched, closed)
//! and one metric record per pipeline job. This subsystem serves both feeds
//! over HTTP and renders them live for an operator.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────────┐  GET /api/activity  ┌─────────────────────────────────────┐
//! │ watch (view) │ ──────────────────> │  server.rs  (axum Router)           │
//! │              │ <────────────────── │    └─ api.rs  (handlers, ApiError)  │
//! └──────────────┘  GET /api/metrics   │         │ WindowQuery::from_raw()   │
//!        │                             │         v                           │
//!        │ Poller × 2                  │  provider.rs  (ActivityProvider)    │
//!        v                             │         │ JsonlProvider             │
//!  feed.rs / metrics_table.rs          │         v                           │
//!  (FeedView, MetricsView)             │  state/github-events.jsonl          │
//!                                      │  data/metrics.jsonl                 │
//!                                      └─────────────────────────────────────┘
//! ```
//!
//! ## Supporting Modules
//!
//! | Module          | Responsibility                                          |
//! |-----------------|---------------------------------------------------------|
//! | `models`        | `GitHubEvent`, `EventKind`, `MetricEntry`, envelopes    |
//! | `query`         | `WindowQuery`, `ProjectSlug`, `days` fallback           |
//! | `catalog`       | `EventCatalog` (type → label/category), `time_ago`      |
//! | `poller`        | `Poller` — fixed-interval fetch, out-of-order guard     |
//! | `client`        | `ApiClient` (reqwest), `ProviderSource` (in-process)    |
//! | `view`          | `ActivityView` — both polls plus rendering              |
//!
//! ## Typical Refresh Cycle
//!
//! 1. The events `Poller` ticks and spawns cycle N with the current query.
//! 2. `ApiClient` issues `GET /api/activity?days=7&project=...`.
//! 3. `api::get_activity` validates the slug, calls
//!    `ActivityProvider::query_events`, and replies `{"events": [...]}`.
//! 4. The poller applies cycle N only if nothing newer has been applied and
//!    the query has not changed since N was issued.
//! 5. `ActivityView::render` classifies each event through the
//!    `EventCatalog` and redraws.

pub mod api;
pub mod catalog;
pub mod client;
pub mod feed;
pub mod metrics_table;
pub mod models;
pub mod poller;
pub mod provider;
pub mod query;
pub mod server;
pub mod view;
