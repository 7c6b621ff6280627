//! Logging and error tracking bootstrap.
//!
//! Sentry must be initialised before the tracing subscriber so the Sentry
//! layer has a client to send to. Keep the returned guard alive for the
//! lifetime of the process; dropping it flushes pending events.

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, SentryConfig, StorefrontConfig};

/// Default filter when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "printquote_storefront=info";

/// Keeps error tracking alive.
#[must_use = "dropping the guard shuts down error tracking"]
pub struct TelemetryGuard {
    _sentry: Option<sentry::ClientInitGuard>,
}

/// Initialize Sentry and the global tracing subscriber.
///
/// # Errors
///
/// Returns error if a global subscriber is already installed.
pub fn init(config: &StorefrontConfig) -> Result<TelemetryGuard, TryInitError> {
    let sentry = init_sentry(&config.sentry);
    init_tracing(config.log_format)?;
    if sentry.is_some() {
        tracing::info!("Sentry initialized");
    }
    Ok(TelemetryGuard { _sentry: sentry })
}

/// Initialize Sentry error tracking. `None` when no DSN is configured.
#[must_use]
pub fn init_sentry(config: &SentryConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.dsn.as_ref()?;

    Some(sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config.environment.clone().map(std::borrow::Cow::Owned),
            sample_rate: config.sample_rate,
            traces_sample_rate: config.traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    )))
}

/// Install the global subscriber: `EnvFilter`, a fmt layer and the Sentry
/// layer.
///
/// # Errors
///
/// Returns error if a global subscriber is already installed.
pub fn init_tracing(format: LogFormat) -> Result<(), TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let json = format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .try_init()
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentry_disabled_without_dsn() {
        assert!(init_sentry(&SentryConfig::default()).is_none());
    }

    #[test]
    fn test_init_tracing_only_once() {
        // Other tests may have installed a subscriber already; either way
        // the second call must fail rather than panic.
        let _ = init_tracing(LogFormat::Pretty);
        assert!(init_tracing(LogFormat::Json).is_err());
    }
}
