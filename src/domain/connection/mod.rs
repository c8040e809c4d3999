//! Connection domain - lifecycle states, backoff, and health reporting for
//! streaming sockets.

mod backoff;
mod errors;
mod health;
mod state;

pub use backoff::{Backoff, BackoffDecision, ReconnectPolicy};
pub use errors::ConnectionError;
pub use health::HealthStatus;
pub use state::ConnectionState;
