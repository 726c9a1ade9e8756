//! `ClusterResourcePlacement`, the user's declared intent (§3).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{condition::Condition, model::int_or_percent::IntOrPercent};

/// A selector identifying a set of resources to propagate. Kept intentionally
/// generic (group/version/kind plus an optional label selector) since the
/// shape of resource selection itself is not this core's concern -- only
/// that a `Placement` carries a list of them (§3).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSelector {
    pub group: String,
    pub version: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "std::collections::BTreeMap::is_empty")]
    pub label_selector: std::collections::BTreeMap<String, String>,
}

/// A Kubernetes-style affinity/topology-spread match expression, evaluated by
/// the scheduling framework's Score plugins (§4.C).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchExpression {
    pub key: String,
    pub operator: MatchOperator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum MatchOperator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

/// A weighted preference used by the ClusterAffinity Score plugin (§4.C).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeightedAffinityTerm {
    /// May be negative; plugin outputs are clamped to `[minScore, maxScore]`
    /// before normalization (§4.C).
    pub weight: i32,
    pub match_expressions: Vec<MatchExpression>,
}

/// Affinity preferences for a `PickN` placement (§3).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAffinity {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<MatchExpression>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferred: Vec<WeightedAffinityTerm>,
}

/// Topology spread constraint for a `PickN` placement (§3, §4.C).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopologySpreadConstraint {
    pub topology_key: String,
    pub max_skew: u32,
    /// May be negative; see [`WeightedAffinityTerm`].
    pub weight: i32,
}

/// A toleration allowing a cluster with a matching taint to still be
/// schedulable (§4.C Filter plugins).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Toleration {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// The three placement policy variants (§3, GLOSSARY).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlacementPolicy {
    PickAll,
    PickN {
        #[serde(rename = "n")]
        n: u32,
        #[serde(default)]
        affinity: ClusterAffinity,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        topology_spread: Vec<TopologySpreadConstraint>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tolerations: Vec<Toleration>,
    },
    PickFixed {
        cluster_names: Vec<String>,
    },
}

/// The rollout strategy for a CRP (§3, §4.D).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RolloutStrategy {
    RollingUpdate {
        max_surge: IntOrPercent,
        max_unavailable: IntOrPercent,
        unavailable_period_seconds: u32,
    },
    /// Rollout is driven by an external system; the core only tracks
    /// bindings, it never gates admission (§1 scope: "external collaborators").
    External,
}

/// The declarative placement intent (§3 `Placement`/`CRP`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlacementSpec {
    pub selectors: Vec<ResourceSelector>,
    pub policy: PlacementPolicy,
    pub strategy: RolloutStrategy,
    pub revision_history_limit: u32,
}

/// `ClusterResourcePlacement.status` (§4.F).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlacementStatus {
    pub selected_resources: Vec<crate::model::ClusterWideKey>,
    pub placement_statuses: Vec<ClusterPlacementStatus>,
    pub conditions: Vec<Condition>,
    pub observed_resource_index: String,
}

/// One entry of `PlacementStatus.placementStatuses` (§4.F): a selected
/// cluster's full condition chain, or -- for `PickN`/`PickFixed` -- an
/// explanatory entry for an unmet target / missing name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterPlacementStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_placements: Vec<FailedResourcePlacement>,
}

/// A single entry in `ClusterPlacementStatus.failedPlacements`, capped at
/// `maxFailedResourcePlacementLimit` (§4.E).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FailedResourcePlacement {
    pub resource: crate::model::ClusterWideKey,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Full `ClusterResourcePlacement` object: spec plus generation plus status.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub name: String,
    pub generation: i64,
    pub spec: PlacementSpec,
    #[serde(default)]
    pub status: PlacementStatus,
}
