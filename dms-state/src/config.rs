//! Controller configuration
//!
//! Serializable so a host application can persist it next to its own
//! settings. Every field has a default; partial documents are fine.

use serde::{Deserialize, Serialize};

/// How the engine decides whether its list is still in step with the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResyncPolicy {
    /// Compare the local count against the source's count after every
    /// event. O(1); drift that keeps counts equal goes unnoticed until the
    /// counts diverge.
    #[default]
    CountCheck,
    /// Compare the full identity sequence with the source's list after
    /// every event. O(n) per event; catches every divergence.
    FullDiff,
}

/// What `select()` does with a device that is not in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Fail with [`StateError::InvalidSelection`](crate::StateError::InvalidSelection).
    #[default]
    Reject,
    /// Accept it; the loss path or the next resync clears it.
    Tolerate,
}

/// Configuration for [`Controller`](crate::Controller)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub resync_policy: ResyncPolicy,
    pub selection_policy: SelectionPolicy,
    /// Name of the update thread
    pub thread_name: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            resync_policy: ResyncPolicy::default(),
            selection_policy: SelectionPolicy::default(),
            thread_name: "dms-state-update".to_string(),
        }
    }
}
