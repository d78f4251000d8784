//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set. Otherwise the level is `info` (`debug` with
//! `--verbose`) and the HTTP stack is held at `warn`. Logs go to stderr so
//! `zapat events --json` output stays parseable.

use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

fn default_filter(verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { "info" };
    let mut filter = EnvFilter::new(level);
    for directive in ["hyper=warn", "hyper_util=warn", "reqwest=warn", "h2=warn", "tower=warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(verbose: bool, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose));

    let layer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed()
    };

    let _ = tracing_subscriber::registry().with(layer).try_init();
}
