//! State machine trait for lifecycle enums.
//!
//! Gives every lifecycle status a single, validated way to move between
//! states instead of ad-hoc assignments scattered through the controller.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// Implementors declare the legal edges; callers use [`transition_to`]
/// which rejects anything else.
///
/// # Example
///
/// ```ignore
/// let next = ConnectionState::Connecting.transition_to(ConnectionState::Handshaking)?;
/// assert!(ConnectionState::Closed.is_terminal());
/// ```
///
/// [`transition_to`]: StateMachine::transition_to
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
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
