//! Override application (§4.E): cluster-resource-level overrides apply to
//! every manifest in a snapshot; resource-level overrides apply to one
//! manifest by ordinal. Both are JSON-Patch documents applied in declaration
//! order; operations from different overrides that touch the same path with
//! different effective values are a conflict (reason `OverriddenFailed`).

use fleet_core::model::Override;
use json_patch::PatchOperation;

use crate::error::ControllerError;

/// Returns the overrides applicable to `ordinal`, cluster-resource-level
/// overrides first, in declaration order (§4.E: "resource-level overrides
/// applied after cluster-resource-level overrides").
fn applicable<'a>(overrides: &'a [Override], ordinal: u32) -> Vec<&'a Override> {
    let cluster_level = overrides.iter().filter(|o| o.target_ordinal.is_none());
    let resource_level = overrides
        .iter()
        .filter(move |o| o.target_ordinal == Some(ordinal));
    cluster_level.chain(resource_level).collect()
}

/// The path an operation targets, and the value it would leave there (`None`
/// for `Remove`/`Move`/`Copy`, since they have no literal resulting value to
/// compare).
fn op_fingerprint(op: &PatchOperation) -> (String, Option<&serde_json::Value>) {
    match op {
        PatchOperation::Add(o) => (o.path.to_string(), Some(&o.value)),
        PatchOperation::Replace(o) => (o.path.to_string(), Some(&o.value)),
        PatchOperation::Remove(o) => (o.path.to_string(), None),
        PatchOperation::Move(o) => (o.path.to_string(), None),
        PatchOperation::Copy(o) => (o.path.to_string(), None),
        PatchOperation::Test(o) => (o.path.to_string(), Some(&o.value)),
    }
}

/// Detects two distinct overrides writing different values to the same JSON
/// pointer path (§4.E: "conflicting JSON-patch operations fail with reason
/// `OverriddenFailed`").
fn detect_conflict(overrides: &[&Override]) -> Option<String> {
    let mut seen: std::collections::HashMap<String, &serde_json::Value> = std::collections::HashMap::new();
    for o in overrides {
        for op in o.patch.0.iter() {
            let (path, value) = op_fingerprint(op);
            let Some(value) = value else { continue };
            match seen.get(&path) {
                Some(prev) if *prev != value => {
                    return Some(format!("path {path:?} set to conflicting values"));
                }
                _ => {
                    seen.insert(path, value);
                }
            }
        }
    }
    None
}

/// Applies every override targeting `ordinal` to `manifest` in order,
/// failing with [`ControllerError::OverrideConflict`] if any two overrides
/// disagree on the same path.
pub fn apply_overrides(
    manifest: &mut serde_json::Value,
    ordinal: u32,
    manifest_name: &str,
    overrides: &[Override],
) -> Result<(), ControllerError> {
    let applicable = applicable(overrides, ordinal);
    if applicable.is_empty() {
        return Ok(());
    }

    if let Some(message) = detect_conflict(&applicable) {
        return Err(ControllerError::OverrideConflict {
            manifest: manifest_name.to_string(),
            message,
        });
    }

    for o in applicable {
        json_patch::patch(manifest, &o.patch).map_err(|e| ControllerError::OverrideConflict {
            manifest: manifest_name.to_string(),
            message: e.to_string(),
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn override_with(target_ordinal: Option<u32>, ops: Vec<PatchOperation>) -> Override {
        Override {
            target_ordinal,
            patch: json_patch::Patch(ops),
        }
    }

    fn replace(path: &str, value: serde_json::Value) -> PatchOperation {
        serde_json::from_value(json!({"op": "replace", "path": path, "value": value})).unwrap()
    }

    #[test]
    fn non_conflicting_overrides_apply_in_order() {
        let mut manifest = json!({"spec": {"replicas": 1, "image": "old"}});
        let overrides = vec![
            override_with(None, vec![replace("/spec/replicas", json!(3))]),
            override_with(Some(0), vec![replace("/spec/image", json!("new"))]),
        ];

        apply_overrides(&mut manifest, 0, "deployment/web", &overrides).unwrap();

        assert_eq!(manifest, json!({"spec": {"replicas": 3, "image": "new"}}));
    }

    #[test]
    fn resource_level_override_does_not_apply_to_other_ordinals() {
        let mut manifest = json!({"spec": {"replicas": 1}});
        let overrides = vec![override_with(Some(1), vec![replace("/spec/replicas", json!(9))])];

        apply_overrides(&mut manifest, 0, "deployment/web", &overrides).unwrap();

        assert_eq!(manifest, json!({"spec": {"replicas": 1}}));
    }

    #[test]
    fn conflicting_overrides_on_same_path_fail() {
        let mut manifest = json!({"spec": {"replicas": 1}});
        let overrides = vec![
            override_with(None, vec![replace("/spec/replicas", json!(3))]),
            override_with(None, vec![replace("/spec/replicas", json!(5))]),
        ];

        let err = apply_overrides(&mut manifest, 0, "deployment/web", &overrides).unwrap_err();
        assert!(matches!(err, ControllerError::OverrideConflict { .. }));
    }

    #[test]
    fn identical_overrides_on_same_path_do_not_conflict() {
        let mut manifest = json!({"spec": {"replicas": 1}});
        let overrides = vec![
            override_with(None, vec![replace("/spec/replicas", json!(3))]),
            override_with(Some(0), vec![replace("/spec/replicas", json!(3))]),
        ];

        apply_overrides(&mut manifest, 0, "deployment/web", &overrides).unwrap();
        assert_eq!(manifest, json!({"spec": {"replicas": 3}}));
    }
}
