//! `PolicySnapshot` and `ResourceSnapshot`: immutable, content-addressed
//! captures of a CRP's policy and selected resources (§3, §4.A).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{condition::Condition, model::placement::PlacementPolicy};

/// `(clusterName, selected, score, reason)` (§3). Stored inside the
/// `PolicySnapshot` status, ordered deterministically by `(-score,
/// clusterName)` (§4.C step 5).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDecision {
    pub cluster_name: String,
    pub selected: bool,
    pub score: ClusterScore,
    pub reason: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterScore {
    pub topology: i32,
    pub affinity: i32,
}

impl ClusterScore {
    pub fn total(&self) -> i32 {
        self.topology.saturating_add(self.affinity)
    }
}

/// Sort key implementing §4.C step 5 / §4.A `ClusterDecision` ordering:
/// `(-score, clusterName)`, giving deterministic tie-break on score equality
/// (testable property 6, scenario 6).
pub fn decision_sort_key(decision: &ClusterDecision) -> (i64, &str) {
    (-(decision.score.total() as i64), decision.cluster_name.as_str())
}

/// Sorts decisions in place by the shared deterministic ordering used by
/// both the Scheduler write-back (§4.C) and the Placement Aggregator's
/// unmet-target reporting (§4.F).
pub fn sort_decisions(decisions: &mut [ClusterDecision]) {
    decisions.sort_by(|a, b| decision_sort_key(a).cmp(&decision_sort_key(b)));
}

/// Immutable copy of the placement policy at a particular generation (§3).
/// Keyed `(crpName, policyIndex)` with monotone `policyIndex`; exactly one
/// snapshot is marked `latest` per CRP.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicySnapshot {
    pub crp_name: String,
    pub policy_index: u64,
    pub is_latest: bool,
    /// The CRP `generation` this snapshot was taken from, used to enforce
    /// §3 invariant 5 via the condition chain's `observedGeneration`.
    pub crp_generation: i64,
    pub policy: PlacementPolicy,
    #[serde(default)]
    pub decisions: Vec<ClusterDecision>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Immutable, content-addressed copy of selected resource manifests (§3).
/// A logical snapshot may split into sub-snapshots (`master` + subindex
/// `0..k`) when contents exceed a size budget; `master` carries the total
/// count, `subindex` is a non-negative integer (`-1` is invalid).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSnapshot {
    pub crp_name: String,
    /// Monotone per CRP, shared by a master and all of its sub-snapshots.
    pub resource_index: u64,
    pub is_latest: bool,
    /// `None` on a master with a single sub-snapshot folded into it;
    /// `Some(0..k)` on a split master's children. `-1` is never
    /// representable since the type is unsigned (§3, §6).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subindex: Option<u32>,
    /// Present only on the master; the total number of sub-snapshots that
    /// belong to it (§4.A).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_resource_snapshots: Option<u32>,
    /// Content hash over the canonicalized, ordered resource list (§4.A).
    pub content_hash: String,
    /// The raw manifests carried by this (sub-)snapshot, decoded.
    pub manifests: Vec<serde_json::Value>,
}

impl ResourceSnapshot {
    pub fn is_master(&self) -> bool {
        self.number_of_resource_snapshots.is_some()
    }
}
