use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Opaque reference to one open page of the session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageHandle {
    id: String,
}

impl PageHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for PageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// When a navigation counts as finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitCondition {
    /// `document.readyState` is `complete`.
    #[default]
    Load,
    /// The DOM is parsed; subresources may still be loading.
    DomContentLoaded,
    /// `complete`, followed by a short settle period for late requests.
    NetworkIdle,
}

impl WaitCondition {
    /// Whether a reported `document.readyState` satisfies this condition.
    pub fn is_met_by(&self, ready_state: &str) -> bool {
        match self {
            WaitCondition::DomContentLoaded => {
                matches!(ready_state, "interactive" | "complete")
            }
            WaitCondition::Load | WaitCondition::NetworkIdle => ready_state == "complete",
        }
    }

    pub fn settle_delay(&self) -> Duration {
        match self {
            WaitCondition::NetworkIdle => Duration::from_millis(500),
            _ => Duration::ZERO,
        }
    }
}

/// Size of the captured area in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

/// Script returning `document.readyState`.
pub(crate) const READY_STATE_SCRIPT: &str = "return document.readyState;";
