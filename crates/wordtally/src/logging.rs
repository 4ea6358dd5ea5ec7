//! Tracing initialization.
//!
//! The engine logs through the `log` facade and opens `tracing` spans per job
//! and per file. Both end up in the same subscriber.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "WORDTALLY_LOG";

const DEFAULT_FILTER: &str = "wordtally=info";

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Installs the global subscriber. Idempotent.
///
/// Reads `WORDTALLY_LOG` (e.g. `wordtally=debug`), falling back to
/// `wordtally=info` when unset or invalid. Records emitted through the `log`
/// crate are forwarded into tracing.
pub fn init_tracing(format: LogFormat) {
    INIT.call_once(|| {
        if let Err(e) = tracing_log::LogTracer::init() {
            eprintln!("Failed to install log bridge: {}", e);
        }

        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let registry = tracing_subscriber::registry().with(filter);
        let result = match format {
            LogFormat::Pretty => tracing::subscriber::set_global_default(
                registry.with(fmt::layer().with_target(true).with_writer(std::io::stderr)),
            ),
            LogFormat::Json => tracing::subscriber::set_global_default(
                registry.with(fmt::layer().json().with_writer(std::io::stderr)),
            ),
        };

        if let Err(e) = result {
            eprintln!("Failed to install tracing subscriber: {}", e);
        }
    });
}
