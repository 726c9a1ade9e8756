//! `ResourceBinding`: the intent to place a specific `ResourceSnapshot` on a
//! specific cluster (§3, §4.D).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::condition::Condition;

/// Binding state machine (§4.D):
///
/// ```text
/// Scheduled --(admit)--> Bound --(target cluster lost)--> Unscheduled
///              ^                                             |
///              └───(rescheduled)────────────────────────────-┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum BindingState {
    Scheduled,
    Bound,
    Unscheduled,
}

/// A JSON-Patch override applied to one or more manifests in declaration
/// order (§4.E). Resource-level overrides are applied after
/// cluster-resource-level overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Override {
    /// Targets a specific manifest by ordinal within the snapshot; `None`
    /// means a cluster-resource-level override applying to every manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_ordinal: Option<u32>,
    pub patch: json_patch::Patch,
}

/// The intent to place a specific `ResourceSnapshot` on a specific cluster
/// (§3 `ResourceBinding`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceBinding {
    pub name: String,
    pub crp_name: String,
    pub state: BindingState,
    pub target_cluster: String,
    pub resource_snapshot_name: String,
    #[serde(default)]
    pub overrides: Vec<Override>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_placements: Vec<crate::model::placement::FailedResourcePlacement>,
    /// The last time this binding transitioned to `Available = True`. Used
    /// to compute the unavailability dwell window (§4.D point 3): for
    /// `unavailablePeriodSeconds` after this timestamp the binding still
    /// counts against the unavailability budget for *other* bindings'
    /// promotion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_available_transition_time: Option<OffsetDateTime>,
}

impl ResourceBinding {
    /// Whether this binding is still within its post-availability dwell
    /// window and therefore still counts against the unavailability budget
    /// (§4.D point 3).
    pub fn is_recently_rolled(&self, now: OffsetDateTime, unavailable_period_seconds: u32) -> bool {
        match self.last_available_transition_time {
            Some(t) => now - t < time::Duration::seconds(unavailable_period_seconds as i64),
            None => false,
        }
    }
}
