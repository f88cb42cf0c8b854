//! Logging setup shared by the server and the terminal chat.

use std::io::{self, IsTerminal};

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        w.write_str(&now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
    }
}

/// Builds an `EnvFilter` from `RUST_LOG`, or from `default` when unset/invalid.
pub fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Installs the global subscriber.
///
/// - `RUST_LOG` wins, otherwise `default_filter` (e.g. `"info"`)
/// - compact single-line format with RFC3339 UTC timestamps
/// - ANSI colors only when the chosen stream (stderr or stdout) is a terminal
///
/// # Errors
/// Fails if a global subscriber is already installed.
pub fn init(default_filter: &str, writer_is_stderr: bool) -> Result<(), TryInitError> {
    let use_ansi = if writer_is_stderr {
        io::stderr().is_terminal()
    } else {
        io::stdout().is_terminal()
    };

    let layer = fmt::layer()
        .with_timer(ChronoRfc3339Utc)
        .with_target(true)
        .with_ansi(use_ansi)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .compact();

    let registry = tracing_subscriber::registry().with(env_filter(default_filter));
    if writer_is_stderr {
        registry.with(layer.with_writer(io::stderr)).try_init()
    } else {
        registry.with(layer).try_init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_compact_rfc3339_utc() {
        let mut out = String::new();
        ChronoRfc3339Utc.format_time(&mut Writer::new(&mut out)).unwrap();
        assert_eq!(out.len(), "2025-09-12T10:20:30Z".len());
        assert!(out.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&out).is_ok());
    }
}
