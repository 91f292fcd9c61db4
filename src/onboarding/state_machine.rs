use crate::onboarding::error::{OnboardingError, OnboardingResult};
use crate::onboarding::types::{TutorialEvent, TutorialState};
use crate::store::{keys, KeyValueStore};
use std::sync::Arc;

/// Guided-tour progress, persisted in the durable store
pub struct TutorialStateMachine {
    state: TutorialState,
    store: Arc<dyn KeyValueStore>,
}

impl TutorialStateMachine {
    /// Load the persisted state; missing or unreadable means `New`
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let state = match store.get(keys::TUTORIAL_STATE) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(value = %raw, error = %e, "Unreadable tutorial state, starting over");
                TutorialState::New
            }),
            Ok(None) => TutorialState::New,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read tutorial state");
                TutorialState::New
            }
        };

        Self { state, store }
    }

    pub fn current_state(&self) -> TutorialState {
        self.state
    }

    pub fn should_show(&self) -> bool {
        self.state.should_show()
    }

    pub fn transition(&mut self, event: TutorialEvent) -> OnboardingResult<TutorialState> {
        let new_state = match (self.state, event) {
            (TutorialState::New, TutorialEvent::Start) => TutorialState::Active,

            (TutorialState::Active, TutorialEvent::Complete)
            | (TutorialState::Active, TutorialEvent::Skip) => TutorialState::Completed,

            (_, TutorialEvent::Restart) => TutorialState::New,

            (state, event) => {
                return Err(OnboardingError::InvalidStateTransition(format!(
                    "Cannot handle {event:?} in state {state:?}"
                )));
            }
        };

        tracing::info!(from = ?self.state, to = ?new_state, ?event, "Tutorial transition");
        self.state = new_state;
        self.persist();
        Ok(new_state)
    }

    fn persist(&self) {
        match serde_json::to_string(&self.state) {
            Ok(json) => {
                if let Err(e) = self.store.set(keys::TUTORIAL_STATE, &json) {
                    tracing::warn!(error = %e, "Failed to persist tutorial state");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to encode tutorial state"),
        }
    }
}
