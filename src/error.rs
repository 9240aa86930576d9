//! Crate-level error types for load operations and controller calls.

use crate::form::ValidationErrors;
use crate::load::LoadStatus;

/// Error returned when a load operation is rejected.
///
/// Every variant is recoverable at the point of the user action that
/// triggered it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    /// No load with the given id exists in the store.
    ///
    /// Raised by accept and lifecycle operations, and by QR lookups of an
    /// unknown scanned id. Presented as a retryable condition.
    #[error("load {0} not found")]
    NotFound(String),

    /// The load's current status does not permit the requested action.
    #[error("load {id} is {status} and cannot be {action}")]
    InvalidState {
        /// Id of the load the action targeted.
        id: String,
        /// Status the load was in when the action was attempted.
        status: LoadStatus,
        /// Past-tense name of the rejected action (e.g. "accepted").
        action: &'static str,
    },

    /// The post-load form failed validation.
    ///
    /// Carries a message for every failing field, not just the first.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// A progress update outside `0..=100`.
    #[error("progress {0}% is out of range")]
    ProgressOutOfRange(u8),

    /// Two initial loads share an id.
    #[error("duplicate load id {0}")]
    DuplicateId(String),

    /// An initial load whose progress is not allowed for its status.
    #[error("load {id} is {status} with progress {progress}%")]
    InconsistentProgress {
        id: String,
        status: LoadStatus,
        progress: u8,
    },

    /// The id sequence has no unused value left for a new load.
    #[error("no load ids left to assign")]
    IdsExhausted,

    /// A filter name that is not one of the supported filters.
    #[error("unknown load filter {0:?}")]
    UnknownFilter(String),
}

/// Error returned when a call through a [`ControllerHandle`] fails.
///
/// [`ControllerHandle`]: crate::ControllerHandle
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    /// Operation rejected by load logic.
    #[error(transparent)]
    Domain(#[from] LoadError),

    /// The controller was torn down before the operation completed.
    ///
    /// Delayed completions are aborted on shutdown, so no state was
    /// mutated on behalf of this call.
    #[error("operation cancelled: controller shut down before completion")]
    Cancelled,

    /// The controller task has exited and accepts no further messages.
    #[error("controller actor is no longer running")]
    ActorGone,
}

impl ExecuteError {
    /// Returns the domain error, if this is one.
    pub fn as_domain(&self) -> Option<&LoadError> {
        match self {
            Self::Domain(err) => Some(err),
            _ => None,
        }
    }
}
