#![forbid(unsafe_code)]

//! Process-wide tracing setup.
//!
//! Onyx crates log under the `onyx.*` targets (`onyx.store`, `onyx.drag`,
//! `onyx.sync`, `onyx.session`, `onyx.storage`). Libraries never install a
//! subscriber themselves; binaries call [`init_tracing`] once at startup.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Build the filter: `RUST_LOG` when set and valid, else the configured
/// directive, else `info`.
#[must_use]
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a global fmt subscriber.
///
/// Returns `false` if a global subscriber was already installed, in which
/// case nothing changes. Safe to call more than once.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_target(true);
    let installed = if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };
    if installed {
        tracing::debug!(target: "onyx.session", json = config.json, filter = %config.filter, "tracing initialized");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_noop() {
        let config = LoggingConfig::default();
        let _ = init_tracing(&config);
        assert!(!init_tracing(&config));
    }

    #[test]
    fn invalid_filter_falls_back() {
        let config = LoggingConfig {
            filter: "onyx=notalevel".into(),
            json: false,
        };
        // Must not panic.
        let _ = env_filter(&config);
    }
}
