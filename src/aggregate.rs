//! Aggregate trait: decide on commands, fold events.

use serde::{Serialize, de::DeserializeOwned};

/// A domain record whose state changes only through its own events.
///
/// The implementing type itself serves as the state. Commands are decided
/// by [`handle`](Aggregate::handle) and the resulting events are folded
/// through [`apply`](Aggregate::apply).
///
/// # Contract
///
/// - [`handle`](Aggregate::handle) must be a pure decision function: no
///   I/O, no side effects. It validates a command against the current state
///   and returns zero or more events.
/// - [`apply`](Aggregate::apply) must be a pure, total function. It takes
///   ownership of the current state and a reference to an event, returning
///   the next state.
pub trait Aggregate: Clone + Serialize + Send + Sync + 'static {
    /// Identifies this aggregate type (e.g. "load"). Used in log fields.
    const AGGREGATE_TYPE: &'static str;

    /// The set of commands this aggregate can handle.
    type Command: Send + 'static;

    /// The set of events this aggregate can produce and apply.
    type DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone + 'static;

    /// Command rejection / validation error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Validate a command against the current state and produce events.
    ///
    /// Returns `Ok(vec![])` if the command is a no-op.
    /// Returns `Err` to reject the command.
    fn handle(&self, cmd: Self::Command) -> Result<Vec<Self::DomainEvent>, Self::Error>;

    /// Apply a single event to produce the next state.
    fn apply(self, event: &Self::DomainEvent) -> Self;
}

/// Decide `cmd` against `state` and fold the produced events into it.
///
/// Returns the next state together with the events that produced it. On
/// rejection the original state is left untouched (it is only borrowed
/// until the decision succeeds).
///
/// # Errors
///
/// Returns the aggregate's error type when [`Aggregate::handle`] rejects
/// the command.
pub fn execute<A: Aggregate>(
    state: &A,
    cmd: A::Command,
) -> Result<(A, Vec<A::DomainEvent>), A::Error> {
    let events = state.handle(cmd)?;
    let next = events
        .iter()
        .fold(state.clone(), |state, event| state.apply(event));
    Ok((next, events))
}
