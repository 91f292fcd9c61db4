mod error;
mod state_machine;
mod types;

pub use error::{OnboardingError, OnboardingResult};
pub use state_machine::TutorialStateMachine;
pub use types::{TutorialEvent, TutorialState};
