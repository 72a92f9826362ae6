//! Tracing setup for the runner and for hosts that want the detector's logs.
//!
//! Per-tick chatter (scheduling, ignored scene changes, fallback sampling) is
//! `trace!`/`debug!`; pulses and start/stop are `info!`. The configured level
//! picks between the two unless `RUST_LOG` is set.

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Level used when the configured directive does not parse.
const FALLBACK_LEVEL: &str = "info";

/// Builds the filter for `config.level`, falling back to `info` on a bad
/// directive instead of silencing everything.
pub fn level_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_new(&config.level).unwrap_or_else(|err| {
        eprintln!(
            "scene_pulse: ignoring log level {:?} ({err}), using {FALLBACK_LEVEL}",
            config.level
        );
        EnvFilter::new(FALLBACK_LEVEL)
    })
}

/// Installs the global subscriber. Returns `false` when one was already set,
/// which leaves the existing one in place.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(config));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    installed.is_ok()
}
