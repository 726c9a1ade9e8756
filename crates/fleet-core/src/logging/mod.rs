//! Initializes `tracing`-based structured logging for the scheduler and
//! controller binaries.
//!
//! Every reconciler method in [`crate::condition`] and the scheduling
//! framework is expected to be wrapped in `#[tracing::instrument]`, so the
//! only remaining job here is wiring up the subscriber once at process
//! startup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Initializes `tracing` logging with options read from the environment
/// variable named in `env`.
///
/// Callers provide a variable name so it can differ per binary, e.g.
/// `FLEET_SCHEDULER_LOG` or `FLEET_CONTROLLER_LOG`. If the variable is unset
/// or contains an invalid filter directive, the default level is `INFO`.
pub fn init(env: &str) {
    let filter = EnvFilter::try_from_env(env)
        .unwrap_or_else(|_| EnvFilter::new(tracing::Level::INFO.to_string()));

    Registry::default()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
