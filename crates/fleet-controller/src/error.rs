//! Controller error types (§7).

use fleet_core::error::{ErrorKind, Kind};
use snafu::Snafu;

#[derive(Debug, Snafu)]
pub enum ControllerError {
    /// Optimistic-concurrency conflict on a binding/Work status update,
    /// exhausted its retry budget (§4.E, §5).
    #[snafu(display("exhausted retries updating {object:?}"))]
    RetriesExhausted { object: String },

    /// An override's JSON-Patch conflicts with another override already
    /// applied to the same manifest (§4.E, §7 User error).
    #[snafu(display("overrides for {manifest:?} conflict: {message}"))]
    OverrideConflict { manifest: String, message: String },

    /// An input violated a data-model invariant, e.g. a `ResourceSnapshot`
    /// with `subindex = -1` is unrepresentable, or a `Work` is missing its
    /// CRP tracking label (§3 invariants, §7 Unexpected behavior).
    #[snafu(display("invariant violated: {message}"))]
    InvariantViolated { message: String },
}

impl ErrorKind for ControllerError {
    fn kind(&self) -> Kind {
        match self {
            ControllerError::RetriesExhausted { .. } => Kind::Transient,
            ControllerError::OverrideConflict { .. } => Kind::UserError,
            ControllerError::InvariantViolated { .. } => Kind::UnexpectedBehavior,
        }
    }
}
