//! State machine trait for lifecycle enums.
//!
//! Connection states and command-history states both route every change
//! through [`StateMachine::transition_to`], so an illegal move is an error
//! value instead of a silently corrupted flag.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// Implementors define valid state transitions and get validated
/// transition methods for free.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for HistoryStatus {
///     fn can_transition_to(&self, target: &Self) -> bool {
///         matches!((self, target), (Idle, Undoing) | (Undoing, Idle) /* ... */)
///     }
///
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Idle => vec![Executing, Undoing, Redoing],
///             _ => vec![Idle],
///         }
///     }
/// }
///
/// let next = HistoryStatus::Idle.transition_to(HistoryStatus::Undoing)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_transition(self, target))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
