//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, the state machine trait, and the
//! validation error shared by every other domain module.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{ClipId, CommandId, EndpointKey, SurfaceId, TrackId, WindowId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
