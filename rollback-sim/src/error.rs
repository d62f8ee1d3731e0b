//! Error types for simulation operations.

use thiserror::Error;

/// Errors that can occur during simulation operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// The simulation has been shut down and is no longer accessible.
    #[error("simulation has been shut down")]
    SimulationShutdown,

    /// The simulation is in an invalid state.
    #[error("invalid simulation state: {0}")]
    InvalidState(String),

    /// A workload stayed pending while no simulation event could wake it.
    #[error("deadlock: workload pending with {pending_events} scheduled event(s)")]
    Deadlock {
        /// Number of events left in the queue when the deadlock was declared.
        pending_events: usize,
    },
}

/// A type alias for `Result<T, SimulationError>`.
pub type SimulationResult<T> = Result<T, SimulationError>;
