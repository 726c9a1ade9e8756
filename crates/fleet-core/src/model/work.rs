//! `Work`: a bundle of manifests targeted at one member cluster (§3, §4.E).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{condition::Condition, model::ClusterWideKey};

/// A wrapper resource whose inner resources are delivered as children,
/// identified by `(name, namespace, type)` (GLOSSARY, §4.E). Modeled as a
/// first-class struct rather than a loose triple since it crosses three call
/// sites (label extraction, failed-placement reporting, Work labelling) and
/// a loose triple risks argument-order bugs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeRef {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "type")]
    pub type_: String,
}

/// One entry of `Work.status`, keyed by ordinal + GVK + name + namespace
/// (§3). Carries both the `Applied` and `Available` stages of the chain for
/// one manifest, with an `observedGeneration` matching the Work's own
/// generation (§4.E: "counted only when `observedGeneration == work.generation`").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManifestCondition {
    /// Stable ordinal assigned by sort order `(group, kind, namespace,
    /// name)`; stays stable across updates when the manifest set is
    /// unchanged (§4.E).
    pub ordinal: u32,
    pub identifier: ClusterWideKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envelope: Option<EnvelopeRef>,
    pub conditions: Vec<Condition>,
}

/// A bundle of manifests targeted at one member cluster, labelled with
/// `(crpName, bindingName, optional envelope)` (§3).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Work {
    pub name: String,
    pub crp_name: String,
    pub binding_name: String,
    pub generation: i64,
    pub manifests: Vec<serde_json::Value>,
    #[serde(default)]
    pub manifest_conditions: Vec<ManifestCondition>,
}
