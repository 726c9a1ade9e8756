//! Scheduling framework error type (§7).

use fleet_core::error::{ErrorKind, Kind};
use snafu::Snafu;

#[derive(Debug, Snafu)]
pub enum SchedulerError {
    /// A plugin hook returned `Error`. `retryable=true` requeues the cycle
    /// with backoff (Transient); `retryable=false` marks the snapshot
    /// permanently failed (Unexpected behavior) (§4.C failure semantics).
    #[snafu(display("plugin {plugin:?} failed: {message}"))]
    Plugin {
        plugin: &'static str,
        message: String,
        retryable: bool,
    },
}

impl ErrorKind for SchedulerError {
    fn kind(&self) -> Kind {
        match self {
            SchedulerError::Plugin { retryable, .. } => {
                if *retryable {
                    Kind::Transient
                } else {
                    Kind::UnexpectedBehavior
                }
            }
        }
    }
}
