//! Controller lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a controller is in its install/activate lifecycle.
///
/// `Parsed` is the state before the first install signal and the state a
/// failed install falls back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Parsed,
    Installing,
    /// Installed and waiting to be activated.
    Installed,
    Activating,
    Activated,
}

impl LifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Parsed => "parsed",
            LifecycleState::Installing => "installing",
            LifecycleState::Installed => "installed",
            LifecycleState::Activating => "activating",
            LifecycleState::Activated => "activated",
        }
    }

    /// Only an activated controller handles fetches.
    pub fn controls_fetches(self) -> bool {
        self == LifecycleState::Activated
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_serde() {
        for state in [
            LifecycleState::Parsed,
            LifecycleState::Installing,
            LifecycleState::Installed,
            LifecycleState::Activating,
            LifecycleState::Activated,
        ] {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{state}\""));
        }
    }

    #[test]
    fn test_only_activated_controls_fetches() {
        assert!(LifecycleState::Activated.controls_fetches());
        assert!(!LifecycleState::Installed.controls_fetches());
        assert!(!LifecycleState::Activating.controls_fetches());
    }
}
