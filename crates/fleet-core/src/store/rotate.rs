//! `RotatePolicy` and `RotateResources` (§4.A): the two named operations that
//! turn a CRP's current spec into the next immutable snapshot generation,
//! layered on top of the generic [`Store`] contract.

use std::collections::BTreeMap;

use crate::{
    kvp::consts::{CRP_TRACKING_LABEL, IS_LATEST_SNAPSHOT_LABEL, SNAPSHOT_INDEX_LABEL},
    model::{PlacementPolicy, PolicySnapshot, ResourceSnapshot},
    store::{Store, StoreError, content_hash},
};

/// Used when the caller does not override it (§4.A leaves the size budget
/// "configured"; this is the default).
pub const DEFAULT_RESOURCE_SNAPSHOT_SIZE_BUDGET_BYTES: usize = 800 * 1024;

fn policy_snapshot_name(crp_name: &str, policy_index: u64) -> String {
    format!("{crp_name}-policy-{policy_index}")
}

fn master_snapshot_name(crp_name: &str, resource_index: u64) -> String {
    format!("{crp_name}-resources-{resource_index}")
}

fn sub_snapshot_name(crp_name: &str, resource_index: u64, subindex: u32) -> String {
    format!("{crp_name}-resources-{resource_index}-{subindex}")
}

fn crp_labels(crp_name: &str, snapshot_index: u64) -> BTreeMap<String, String> {
    BTreeMap::from([
        (CRP_TRACKING_LABEL.to_string(), crp_name.to_string()),
        (IS_LATEST_SNAPSHOT_LABEL.to_string(), "true".to_string()),
        (SNAPSHOT_INDEX_LABEL.to_string(), snapshot_index.to_string()),
    ])
}

/// `RotatePolicy(crp) → PolicySnapshot` (§4.A): creates a new latest
/// `PolicySnapshot` when `policy` differs from the CRP's current latest
/// snapshot, demotes the previous latest, and prunes beyond
/// `revision_history_limit`. Idempotent when the policy is unchanged --
/// returns the existing latest snapshot without writing anything.
pub fn rotate_policy<S: Store<PolicySnapshot>>(
    store: &S,
    crp_name: &str,
    crp_generation: i64,
    policy: &PlacementPolicy,
    revision_history_limit: u32,
) -> Result<PolicySnapshot, StoreError> {
    let mut existing = store.list_by_label(CRP_TRACKING_LABEL, crp_name)?;
    existing.sort_by_key(|v| v.value.policy_index);

    if let Some(latest) = existing.iter().find(|v| v.value.is_latest) {
        if &latest.value.policy == policy {
            return Ok(latest.value.clone());
        }
    }

    let next_index = existing.last().map_or(0, |v| v.value.policy_index + 1);

    for versioned in existing.iter().filter(|v| v.value.is_latest) {
        let mut demoted = versioned.value.clone();
        demoted.is_latest = false;
        store.update(
            &policy_snapshot_name(crp_name, demoted.policy_index),
            versioned.resource_version,
            demoted,
        )?;
    }

    let snapshot = PolicySnapshot {
        crp_name: crp_name.to_string(),
        policy_index: next_index,
        is_latest: true,
        crp_generation,
        policy: policy.clone(),
        decisions: Vec::new(),
        conditions: Vec::new(),
    };
    let created = store.create(
        &policy_snapshot_name(crp_name, next_index),
        crp_labels(crp_name, next_index),
        snapshot,
    )?;

    prune_policy_snapshots(store, crp_name, revision_history_limit)?;

    Ok(created.value)
}

/// Deletes every non-latest `PolicySnapshot` beyond the most recent
/// `revision_history_limit` (§3 invariant 2: "rotation deletes oldest beyond
/// `revisionHistoryLimit`").
fn prune_policy_snapshots<S: Store<PolicySnapshot>>(
    store: &S,
    crp_name: &str,
    revision_history_limit: u32,
) -> Result<(), StoreError> {
    let mut existing = store.list_by_label(CRP_TRACKING_LABEL, crp_name)?;
    existing.sort_by_key(|v| std::cmp::Reverse(v.value.policy_index));

    for versioned in existing.into_iter().skip(revision_history_limit as usize) {
        store.delete(
            &policy_snapshot_name(crp_name, versioned.value.policy_index),
            versioned.resource_version,
        )?;
    }
    Ok(())
}

/// Canonicalizes a manifest list into the bytes [`content_hash`] hashes over.
/// `serde_json::Value`'s default map representation is key-sorted, so this is
/// stable regardless of the manifests' original field order.
fn canonicalize(manifests: &[serde_json::Value]) -> Vec<u8> {
    serde_json::to_vec(manifests).expect("manifest values are always serializable")
}

/// Splits `manifests` into chunks whose canonicalized encoding never exceeds
/// `size_budget_bytes`, preserving input order. A single manifest larger than
/// the budget still gets its own chunk -- it cannot be split further (§4.A).
fn split_by_size_budget(manifests: &[serde_json::Value], size_budget_bytes: usize) -> Vec<Vec<serde_json::Value>> {
    if manifests.is_empty() {
        return vec![Vec::new()];
    }

    let mut chunks = Vec::new();
    let mut current = Vec::new();
    let mut current_size = 0usize;

    for manifest in manifests {
        let manifest_size = canonicalize(std::slice::from_ref(manifest)).len();
        if !current.is_empty() && current_size + manifest_size > size_budget_bytes {
            chunks.push(std::mem::take(&mut current));
            current_size = 0;
        }
        current_size += manifest_size;
        current.push(manifest.clone());
    }
    chunks.push(current);
    chunks
}

/// `RotateResources(crp, manifests) → ResourceSnapshot[]` (§4.A): computes a
/// content hash over the canonicalized manifest list; returns the current
/// latest group unchanged if the hash matches. Otherwise splits into
/// sub-snapshots bounded by `size_budget_bytes`, writes them first, then
/// writes the master with `numberOfResourceSnapshots` set -- last, so no
/// reader ever observes a partial master (§4.A, §5).
pub fn rotate_resources<S: Store<ResourceSnapshot>>(
    store: &S,
    crp_name: &str,
    manifests: &[serde_json::Value],
    size_budget_bytes: usize,
    revision_history_limit: u32,
) -> Result<Vec<ResourceSnapshot>, StoreError> {
    let hash = content_hash(&canonicalize(manifests));

    let mut existing = store.list_by_label(CRP_TRACKING_LABEL, crp_name)?;
    existing.sort_by_key(|v| (v.value.resource_index, v.value.subindex.unwrap_or(0)));

    let current_latest: Vec<_> = existing.iter().filter(|v| v.value.is_latest).collect();
    if let Some(master) = current_latest.iter().find(|v| v.value.is_master()) {
        if master.value.content_hash == hash {
            return Ok(current_latest.into_iter().map(|v| v.value.clone()).collect());
        }
    }

    let next_index = existing.last().map_or(0, |v| v.value.resource_index + 1);
    let chunks = split_by_size_budget(manifests, size_budget_bytes);

    for versioned in &current_latest {
        let mut demoted = versioned.value.clone();
        demoted.is_latest = false;
        let name = match demoted.subindex {
            Some(subindex) => sub_snapshot_name(crp_name, demoted.resource_index, subindex),
            None => master_snapshot_name(crp_name, demoted.resource_index),
        };
        store.update(&name, versioned.resource_version, demoted)?;
    }

    let mut written = Vec::with_capacity(chunks.len() + 1);

    if chunks.len() == 1 {
        let folded = ResourceSnapshot {
            crp_name: crp_name.to_string(),
            resource_index: next_index,
            is_latest: true,
            subindex: None,
            number_of_resource_snapshots: Some(1),
            content_hash: hash,
            manifests: chunks.into_iter().next().unwrap_or_default(),
        };
        let created = store.create(
            &master_snapshot_name(crp_name, next_index),
            crp_labels(crp_name, next_index),
            folded,
        )?;
        written.push(created.value);
    } else {
        let chunk_count = chunks.len() as u32;
        for (subindex, chunk) in chunks.into_iter().enumerate() {
            let subindex = subindex as u32;
            let child = ResourceSnapshot {
                crp_name: crp_name.to_string(),
                resource_index: next_index,
                is_latest: true,
                subindex: Some(subindex),
                number_of_resource_snapshots: None,
                content_hash: hash.clone(),
                manifests: chunk,
            };
            let created = store.create(
                &sub_snapshot_name(crp_name, next_index, subindex),
                crp_labels(crp_name, next_index),
                child,
            )?;
            written.push(created.value);
        }

        let master = ResourceSnapshot {
            crp_name: crp_name.to_string(),
            resource_index: next_index,
            is_latest: true,
            subindex: None,
            number_of_resource_snapshots: Some(chunk_count),
            content_hash: hash,
            manifests: Vec::new(),
        };
        let created = store.create(
            &master_snapshot_name(crp_name, next_index),
            crp_labels(crp_name, next_index),
            master,
        )?;
        written.push(created.value);
    }

    prune_resource_snapshots(store, crp_name, revision_history_limit)?;

    Ok(written)
}

/// Deletes every non-latest `ResourceSnapshot` (master and its children)
/// belonging to a generation beyond the most recent `revision_history_limit`
/// (§3 invariant 2).
fn prune_resource_snapshots<S: Store<ResourceSnapshot>>(
    store: &S,
    crp_name: &str,
    revision_history_limit: u32,
) -> Result<(), StoreError> {
    let mut existing = store.list_by_label(CRP_TRACKING_LABEL, crp_name)?;
    existing.sort_by_key(|v| v.value.resource_index);

    let mut generations: Vec<u64> = existing.iter().map(|v| v.value.resource_index).collect();
    generations.dedup();
    generations.sort_unstable_by(|a, b| b.cmp(a));

    let keep: std::collections::BTreeSet<u64> =
        generations.into_iter().take(revision_history_limit as usize).collect();

    for versioned in existing.into_iter().filter(|v| !keep.contains(&v.value.resource_index)) {
        let name = match versioned.value.subindex {
            Some(subindex) => sub_snapshot_name(crp_name, versioned.value.resource_index, subindex),
            None => master_snapshot_name(crp_name, versioned.value.resource_index),
        };
        store.delete(&name, versioned.resource_version)?;
    }
    Ok(())
}
