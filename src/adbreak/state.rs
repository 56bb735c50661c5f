use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdBreakState {
    #[default]
    Content,
    AdBreak,
}

impl AdBreakState {
    pub fn is_ad_break(self) -> bool {
        matches!(self, AdBreakState::AdBreak)
    }
}

/// Edge reported for a single fragment observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Transition {
    None,
    Entered,
    Exited,
}
