//! Conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

pub mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Effect, Mutation};
pub use event::{Action, Event};
pub use state::{ConvContext, ConvState, Flow, WorkoutStage};
pub use transition::{transition, TransitionError, TransitionResult, ValidationError};
