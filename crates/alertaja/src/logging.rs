//! Logging configuration for alertaja.
//!
//! Logs go to stderr so that command output on stdout (alert lists, deep
//! links, GeoJSON) stays clean for piping.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How much of the board's activity to report on stderr.
///
/// `Normal` keeps a plain `alerts list` quiet apart from warnings such as a
/// corrupt stored collection; `-v` adds reports, votes and sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only (`-q`).
    Quiet,
    /// Warnings, e.g. unreadable stored records.
    #[default]
    Normal,
    /// Board changes: reports, votes, sweeps, courier toggles (`-v`).
    Verbose,
    /// Storage writes and geocoding requests (`-vv`).
    Debug,
    /// Everything (`-vvv`).
    Trace,
}

impl Verbosity {
    /// Level applied to the `alertaja` target.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::INFO,
            Self::Debug => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }
}

/// Install the stderr subscriber for a run of the `alertaja` binary.
///
/// Only events from this crate pass the default filter, so HTTP and SQLite
/// internals stay silent. A set `RUST_LOG` replaces the filter entirely,
/// e.g. `RUST_LOG=alertaja=debug,reqwest=debug` to trace geocoding calls.
///
/// # Examples
///
/// ```no_run
/// use alertaja::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(crate_filter(verbosity)));

    // Module targets tell board, courier and storage events apart
    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    );

    // A second call in the same process keeps the first subscriber
    let _ = subscriber.try_init();
}

fn crate_filter(verbosity: Verbosity) -> String {
    format!("{}={}", env!("CARGO_CRATE_NAME"), verbosity.to_level_filter())
}

/// Route warnings from board and storage code into the test harness output.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
