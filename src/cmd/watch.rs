//! Live terminal dashboard — `zapat watch`.
//!
//! Redraws whenever either poll applies new data, and every few seconds so
//! relative ages stay current. Typing a project slug and Enter re-scopes both
//! polls; `all` clears the filter, `r` refreshes now, `q` quits.

use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use console::{Term, style};
use tokio::sync::mpsc;
use zapat::activity::catalog::EventCatalog;
use zapat::activity::models::{GitHubEvent, MetricEntry};
use zapat::activity::poller::Fetch;
use zapat::activity::query::ProjectSlug;
use zapat::activity::view::{ActivityView, ViewSettings};

use super::Source;
use crate::SourceArgs;

const AGE_REDRAW_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, PartialEq)]
enum Input {
    Quit,
    Refresh,
    Project(Option<ProjectSlug>),
    Invalid(String),
}

fn parse_input(line: &str) -> Option<Input> {
    match line.trim() {
        "" => None,
        "q" | "quit" => Some(Input::Quit),
        "r" | "refresh" => Some(Input::Refresh),
        "all" | "*" => Some(Input::Project(None)),
        slug => Some(match slug.parse::<ProjectSlug>() {
            Ok(project) => Input::Project(Some(project)),
            Err(e) => Input::Invalid(e.to_string()),
        }),
    }
}

pub async fn cmd_watch(
    project_dir: &Path,
    args: &SourceArgs,
    interval_ms: Option<u64>,
) -> Result<()> {
    let config = super::load_config(project_dir)?;
    let query = super::window_query(args, &config)?;

    let settings = ViewSettings {
        days: query.days,
        project: query.project,
        refresh_interval: interval_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or_else(|| config.refresh_interval()),
        github_base_url: config.dashboard.github_base_url.clone(),
        metrics_limit: config.dashboard.metrics_display_limit,
    };
    let catalog = Arc::new(config.catalog());

    match super::resolve_source(args, &config)? {
        Source::Remote(client) => run_view(Arc::new(client), catalog, settings).await,
        Source::Local(provider) => run_view(Arc::new(provider), catalog, settings).await,
    }
}

async fn run_view<S>(source: Arc<S>, catalog: Arc<EventCatalog>, settings: ViewSettings) -> Result<()>
where
    S: Fetch<Vec<GitHubEvent>> + Fetch<Vec<MetricEntry>>,
{
    let term = Term::stdout();
    let mut view = ActivityView::spawn(source, catalog, settings);
    let mut input_rx = spawn_input_reader();
    let mut input_open = true;
    let mut notice: Option<String> = None;

    let mut ages = tokio::time::interval(AGE_REDRAW_INTERVAL);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        draw(&term, &view, notice.as_deref())?;
        tokio::select! {
            _ = &mut shutdown => break,
            alive = view.changed() => {
                if !alive {
                    break;
                }
            }
            line = input_rx.recv(), if input_open => match line.as_deref().and_then(parse_input) {
                Some(Input::Quit) => break,
                Some(Input::Refresh) => view.refresh(),
                Some(Input::Project(project)) => {
                    notice = None;
                    view.set_project(project);
                }
                Some(Input::Invalid(message)) => notice = Some(message),
                None => input_open = line.is_some(),
            },
            _ = ages.tick() => {}
        }
    }

    view.shutdown().await;
    Ok(())
}

/// Stdin lines, read on a dedicated thread. The channel closes at EOF.
fn spawn_input_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn draw(term: &Term, view: &ActivityView, notice: Option<&str>) -> Result<()> {
    term.clear_screen()?;
    for line in view.render(Utc::now()) {
        term.write_line(&line)?;
    }
    term.write_line("")?;
    if let Some(notice) = notice {
        term.write_line(&style(notice).red().to_string())?;
    }
    term.write_line(
        &style("project slug + Enter to filter, 'all' for every project, 'r' refresh, 'q' quit")
            .dim()
            .to_string(),
    )?;
    Ok(())
}
