//! Tracing/logging initialization.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogConfig;
use crate::error::{Error, Result};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `config.filter`. With `config.json` set,
/// log lines are emitted as structured JSON for log aggregation.
pub fn init_tracing(config: &LogConfig) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.filter.clone()),
    );
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    installed.map_err(|e| Error::Config(format!("tracing subscriber: {e}")))
}
