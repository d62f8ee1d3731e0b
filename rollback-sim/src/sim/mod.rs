//! Core simulation engine for deterministic testing.
//!
//! ## Submodules
//!
//! - `world` - Core SimWorld and WeakSimWorld types
//! - `events` - Event types and queue for scheduling
//! - `state` - Fault and process state
//! - `sleep` - Sleep future for simulation time

pub mod events;
pub mod sleep;
pub mod state;
pub mod world;

pub use events::{Event, EventQueue, ScheduledEvent};
pub use sleep::SleepFuture;
pub use state::{ClogMode, FaultKind, FaultRecord, KillType};
pub use world::{SimWorld, WeakSimWorld};
