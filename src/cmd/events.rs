//! One-shot snapshot command — `zapat events`.

use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use console::style;
use zapat::activity::feed::FeedRenderer;
use zapat::activity::metrics_table::MetricsView;
use zapat::activity::models::{GitHubEvent, MetricEntry};
use zapat::activity::poller::Fetch;
use zapat::activity::query::WindowQuery;
use zapat::errors::ActivityError;

use super::Source;
use crate::SourceArgs;

pub async fn cmd_events(project_dir: &Path, args: &SourceArgs, json: bool) -> Result<()> {
    let config = super::load_config(project_dir)?;
    let query = super::window_query(args, &config)?;

    let (events, metrics) = match super::resolve_source(args, &config)? {
        Source::Remote(client) => snapshot(&client, &query).await?,
        Source::Local(provider) => snapshot(&provider, &query).await?,
    };
    tracing::debug!(%query, events = events.len(), metrics = metrics.len(), "snapshot fetched");

    if json {
        let body = serde_json::json!({ "events": events, "metrics": metrics });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let catalog = config.catalog();
    let renderer = FeedRenderer::new(&catalog, &config.dashboard.github_base_url, query.days);
    println!("{}", style("GitHub Activity").bold().underlined());
    for line in renderer.build(&events, false, Utc::now()).render_lines() {
        println!("{}", line);
    }
    println!();
    println!("{}", style("Pipeline Jobs").bold().underlined());
    let table = MetricsView::build(&metrics, false, config.dashboard.metrics_display_limit);
    for line in table.render_lines() {
        println!("{}", line);
    }
    Ok(())
}

/// Both feeds for one window, fetched concurrently.
async fn snapshot<S>(
    source: &S,
    query: &WindowQuery,
) -> Result<(Vec<GitHubEvent>, Vec<MetricEntry>), ActivityError>
where
    S: Fetch<Vec<GitHubEvent>> + Fetch<Vec<MetricEntry>>,
{
    tokio::try_join!(
        <S as Fetch<Vec<GitHubEvent>>>::fetch(source, query),
        <S as Fetch<Vec<MetricEntry>>>::fetch(source, query),
    )
}
