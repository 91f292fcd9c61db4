use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TutorialState {
    /// Not seen yet, or restarted
    #[default]
    New,
    /// Currently on screen
    Active,
    Completed,
}

impl TutorialState {
    pub fn should_show(&self) -> bool {
        matches!(self, TutorialState::New)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TutorialState::Completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TutorialEvent {
    Start,
    Complete,
    Skip,
    Restart,
}
