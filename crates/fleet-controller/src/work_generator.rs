//! The Work Generator (§4.E): materializes per-cluster `Work` objects from a
//! bound binding and its resource snapshot, assigns stable manifest
//! ordinals, applies overrides, and rolls per-manifest status back into the
//! binding's condition chain.

use fleet_core::{
    condition::{Condition, ConditionStatus, ConditionType, RollupReason, rollup},
    kvp::consts::SUBINDEX_ANNOTATION,
    model::{ClusterWideKey, EnvelopeRef, FailedResourcePlacement, ManifestCondition, Work},
};

use crate::{error::ControllerError, overrides::apply_overrides};

/// Default cap on `ClusterPlacementStatus.failedPlacements` entries (§4.E:
/// "capped at `maxFailedResourcePlacementLimit` (default small, e.g. 20)").
pub const DEFAULT_MAX_FAILED_RESOURCE_PLACEMENTS: usize = 20;

/// Computes the Work name for a (sub-)snapshot (§4.E: "Name prefix is
/// `<crpName>-work` when there is a single sub-snapshot, else
/// `<crpName>-<subindex>`"). `subindex = None` means the snapshot was not
/// split.
pub fn work_name(crp_name: &str, subindex: Option<u32>) -> String {
    match subindex {
        None => format!("{crp_name}-work"),
        Some(i) => format!("{crp_name}-{i}"),
    }
}

/// Parses the raw `placement.fleet.io/subindex-of-resource-snapshot`
/// annotation value into a validated subindex. `None` means the annotation
/// is absent (the snapshot is a folded, unsplit master). Any present value
/// that is not a non-negative integer -- including the literal `"-1"` -- is
/// rejected (§3: "`subindex` is a non-negative integer; `-1` is invalid",
/// §6).
pub fn parse_subindex_annotation(raw: Option<&str>) -> Result<Option<u32>, ControllerError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    raw.parse::<u32>()
        .map(Some)
        .map_err(|_| ControllerError::InvariantViolated {
            message: format!("{SUBINDEX_ANNOTATION} value {raw:?} is not a valid non-negative integer"),
        })
}

/// Computes a (sub-)snapshot's Work name directly off its raw annotations
/// map, validating the wire-format subindex annotation rather than trusting
/// an already-typed field (§6).
pub fn work_name_from_annotations(
    crp_name: &str,
    annotations: &std::collections::BTreeMap<String, String>,
) -> Result<String, ControllerError> {
    let subindex = parse_subindex_annotation(annotations.get(SUBINDEX_ANNOTATION).map(String::as_str))?;
    Ok(work_name(crp_name, subindex))
}

/// Extracts a [`ClusterWideKey`] from a decoded manifest's
/// `apiVersion`/`kind`/`metadata.namespace`/`metadata.name` fields.
pub fn cluster_wide_key_of(manifest: &serde_json::Value) -> Result<ClusterWideKey, ControllerError> {
    let api_version = manifest
        .get("apiVersion")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| ControllerError::InvariantViolated {
            message: "manifest missing apiVersion".to_string(),
        })?;
    let kind = manifest
        .get("kind")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| ControllerError::InvariantViolated {
            message: "manifest missing kind".to_string(),
        })?;
    let name = manifest
        .pointer("/metadata/name")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| ControllerError::InvariantViolated {
            message: "manifest missing metadata.name".to_string(),
        })?;
    let namespace = manifest
        .pointer("/metadata/namespace")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("");

    let (group, version) = match api_version.split_once('/') {
        Some((group, version)) => (group, version),
        None => ("", api_version),
    };

    Ok(ClusterWideKey::new(group, version, kind, namespace, name))
}

/// Reads the envelope triple off a wrapped manifest's labels, if present
/// (§4.E, GLOSSARY: "labelled `envelope-name/namespace/type`").
pub fn envelope_of(manifest: &serde_json::Value) -> Option<EnvelopeRef> {
    let name = manifest.pointer("/metadata/labels/envelope-name")?.as_str()?;
    let namespace = manifest
        .pointer("/metadata/labels/envelope-namespace")?
        .as_str()?;
    let type_ = manifest.pointer("/metadata/labels/envelope-type")?.as_str()?;

    Some(EnvelopeRef {
        name: name.to_string(),
        namespace: namespace.to_string(),
        type_: type_.to_string(),
    })
}

/// Sort key for stable ordinal assignment: `(group, kind, namespace, name)`
/// (§4.E: "Ordinals must remain stable across updates when the manifest set
/// is unchanged" -- deliberately excludes `version`, unlike
/// [`ClusterWideKey`]'s own total order, since a version bump alone must not
/// reshuffle ordinals).
fn ordinal_sort_key(key: &ClusterWideKey) -> (&str, &str, &str, &str) {
    (&key.group, &key.kind, &key.namespace, &key.name)
}

/// Decodes, sorts, and applies overrides to every manifest of one
/// (sub-)snapshot, producing a fully-materialized [`Work`] (§4.E).
pub fn synthesize_work(
    name: String,
    crp_name: String,
    binding_name: String,
    generation: i64,
    raw_manifests: &[serde_json::Value],
    overrides: &[fleet_core::model::Override],
) -> Result<Work, ControllerError> {
    let mut keyed: Vec<(ClusterWideKey, serde_json::Value)> = raw_manifests
        .iter()
        .map(|m| cluster_wide_key_of(m).map(|key| (key, m.clone())))
        .collect::<Result<_, _>>()?;

    keyed.sort_by(|(a, _), (b, _)| ordinal_sort_key(a).cmp(&ordinal_sort_key(b)));

    let mut manifest_conditions = Vec::with_capacity(keyed.len());
    let mut manifests = Vec::with_capacity(keyed.len());

    for (ordinal, (key, mut manifest)) in keyed.into_iter().enumerate() {
        let ordinal = ordinal as u32;
        let manifest_name = key.to_string();
        apply_overrides(&mut manifest, ordinal, &manifest_name, overrides)?;

        manifest_conditions.push(ManifestCondition {
            ordinal,
            envelope: envelope_of(&manifest),
            identifier: key,
            conditions: Vec::new(),
        });
        manifests.push(manifest);
    }

    Ok(Work {
        name,
        crp_name,
        binding_name,
        generation,
        manifests,
        manifest_conditions,
    })
}

/// Rolls the Work's per-manifest Applied/Available conditions up into the
/// binding's nested chain (§4.B, §4.E: "a Work condition is counted only
/// when `observedGeneration == work.generation`").
pub fn rollup_binding_chain(work: &Work) -> Vec<Condition> {
    let applied_children: Vec<Condition> = work
        .manifest_conditions
        .iter()
        .flat_map(|mc| mc.conditions.iter())
        .filter(|c| c.observed_generation == work.generation)
        .cloned()
        .collect();

    let applied = rollup(
        &applied_children,
        ConditionType::Applied.rank(),
        work.generation,
        RollupReason::AllWorkApplied,
        RollupReason::WorkNotApplied,
        RollupReason::WorkNotApplied,
    );

    let available_reason_unknown = if applied.status == ConditionStatus::True {
        RollupReason::WorkNotTrackable
    } else {
        RollupReason::NotAvailableYet
    };

    let available = rollup(
        &applied_children,
        ConditionType::Available.rank(),
        work.generation,
        RollupReason::AllWorkAvailable,
        RollupReason::WorkNotAvailable,
        available_reason_unknown,
    );

    vec![applied, available]
}

/// Collects failed placements (`Applied = False`) across a Work's manifests,
/// truncating at `limit` (§4.E: "truncation is explicit; order within the
/// list is not guaranteed once truncated").
pub fn failed_placements(work: &Work, limit: usize) -> Vec<FailedResourcePlacement> {
    let mut failed: Vec<FailedResourcePlacement> = work
        .manifest_conditions
        .iter()
        .filter_map(|mc| {
            let applied = mc
                .conditions
                .iter()
                .find(|c| c.type_ == ConditionType::Applied && c.status == ConditionStatus::False)?;
            Some(FailedResourcePlacement {
                resource: mc.identifier.clone(),
                reason: applied.reason.clone(),
                message: applied.message.clone(),
            })
        })
        .collect();

    if failed.len() > limit {
        tracing::warn!(
            work = %work.name,
            total = failed.len(),
            limit,
            "truncating failed placement list"
        );
        failed.truncate(limit);
    }

    failed
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn deployment(name: &str, namespace: &str) -> serde_json::Value {
        json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": name, "namespace": namespace},
        })
    }

    #[test]
    fn parse_subindex_annotation_accepts_absence_as_unsplit() {
        assert_eq!(parse_subindex_annotation(None).unwrap(), None);
    }

    #[test]
    fn parse_subindex_annotation_accepts_non_negative_integers() {
        assert_eq!(parse_subindex_annotation(Some("0")).unwrap(), Some(0));
        assert_eq!(parse_subindex_annotation(Some("3")).unwrap(), Some(3));
    }

    #[test]
    fn parse_subindex_annotation_rejects_negative_one() {
        let err = parse_subindex_annotation(Some("-1")).unwrap_err();
        assert!(matches!(err, ControllerError::InvariantViolated { .. }));
    }

    #[test]
    fn parse_subindex_annotation_rejects_non_numeric_values() {
        let err = parse_subindex_annotation(Some("not-a-number")).unwrap_err();
        assert!(matches!(err, ControllerError::InvariantViolated { .. }));
    }

    #[test]
    fn work_name_from_annotations_uses_validated_subindex() {
        let annotations = std::collections::BTreeMap::from([(
            SUBINDEX_ANNOTATION.to_string(),
            "2".to_string(),
        )]);
        let name = work_name_from_annotations("demo-crp", &annotations).unwrap();
        assert_eq!(name, "demo-crp-2");
    }

    #[test]
    fn work_name_from_annotations_rejects_invalid_subindex() {
        let annotations = std::collections::BTreeMap::from([(
            SUBINDEX_ANNOTATION.to_string(),
            "-1".to_string(),
        )]);
        assert!(work_name_from_annotations("demo-crp", &annotations).is_err());
    }

    #[test]
    fn work_name_uses_crp_work_suffix_when_unsplit() {
        assert_eq!(work_name("demo-crp", None), "demo-crp-work");
    }

    #[test]
    fn work_name_uses_subindex_when_split() {
        assert_eq!(work_name("demo-crp", Some(2)), "demo-crp-2");
    }

    #[test]
    fn cluster_wide_key_extraction_splits_group_and_version() {
        let key = cluster_wide_key_of(&deployment("web", "default")).unwrap();
        assert_eq!(key.group, "apps");
        assert_eq!(key.version, "v1");
        assert_eq!(key.kind, "Deployment");
        assert_eq!(key.namespace, "default");
        assert_eq!(key.name, "web");
    }

    #[test]
    fn core_v1_manifests_have_empty_group() {
        let manifest = json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": "cfg", "namespace": "default"},
        });
        let key = cluster_wide_key_of(&manifest).unwrap();
        assert_eq!(key.group, "");
        assert_eq!(key.version, "v1");
    }

    #[test]
    fn ordinals_are_assigned_in_group_kind_namespace_name_order() {
        let manifests = vec![deployment("b", "default"), deployment("a", "default")];
        let work = synthesize_work(
            "demo-crp-work".to_string(),
            "demo-crp".to_string(),
            "demo-crp-binding".to_string(),
            1,
            &manifests,
            &[],
        )
        .unwrap();

        assert_eq!(work.manifest_conditions[0].identifier.name, "a");
        assert_eq!(work.manifest_conditions[0].ordinal, 0);
        assert_eq!(work.manifest_conditions[1].identifier.name, "b");
        assert_eq!(work.manifest_conditions[1].ordinal, 1);
    }

    #[test]
    fn rollup_is_unknown_without_any_observed_manifest_conditions() {
        let work = Work {
            name: "w".to_string(),
            crp_name: "demo-crp".to_string(),
            binding_name: "b".to_string(),
            generation: 1,
            manifests: vec![],
            manifest_conditions: vec![ManifestCondition {
                ordinal: 0,
                identifier: ClusterWideKey::new("apps", "v1", "Deployment", "default", "web"),
                envelope: None,
                conditions: vec![],
            }],
        };

        let chain = rollup_binding_chain(&work);
        assert_eq!(chain[0].status, ConditionStatus::Unknown);
    }

    #[test]
    fn rollup_is_true_when_all_manifests_applied_and_available() {
        let mut work = Work {
            name: "w".to_string(),
            crp_name: "demo-crp".to_string(),
            binding_name: "b".to_string(),
            generation: 1,
            manifests: vec![],
            manifest_conditions: vec![ManifestCondition {
                ordinal: 0,
                identifier: ClusterWideKey::new("apps", "v1", "Deployment", "default", "web"),
                envelope: None,
                conditions: vec![],
            }],
        };
        work.manifest_conditions[0].conditions = vec![
            Condition::new(ConditionType::Applied, ConditionStatus::True, "ApplySucceeded", 1),
            Condition::new(ConditionType::Available, ConditionStatus::True, "Available", 1),
        ];

        let chain = rollup_binding_chain(&work);
        assert_eq!(chain[0].status, ConditionStatus::True);
        assert_eq!(chain[1].status, ConditionStatus::True);
    }

    #[test]
    fn failed_placements_truncate_explicitly() {
        let manifest_conditions: Vec<ManifestCondition> = (0..3)
            .map(|i| ManifestCondition {
                ordinal: i,
                identifier: ClusterWideKey::new("apps", "v1", "Deployment", "default", format!("w{i}")),
                envelope: None,
                conditions: vec![Condition::new(
                    ConditionType::Applied,
                    ConditionStatus::False,
                    "ApplyFailed",
                    1,
                )],
            })
            .collect();
        let work = Work {
            name: "w".to_string(),
            crp_name: "demo-crp".to_string(),
            binding_name: "b".to_string(),
            generation: 1,
            manifests: vec![],
            manifest_conditions,
        };

        let failed = failed_placements(&work, 2);
        assert_eq!(failed.len(), 2);
    }
}
