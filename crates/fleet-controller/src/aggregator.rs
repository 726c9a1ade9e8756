//! The Placement Aggregator (§4.F): rolls per-manifest conditions up through
//! per-cluster placement statuses into the top-level CRP status.

use std::collections::BTreeSet;

use fleet_core::{
    condition::{Condition, ConditionChain, ConditionType, RollupReason, rollup},
    model::{
        ClusterPlacementStatus, ClusterWideKey, FailedResourcePlacement, PlacementPolicy,
        ResourceSnapshot,
    },
};

/// `PlacementStatus.selectedResources`: the union of resource identifiers
/// across every sub-snapshot of the latest master (§4.F).
pub fn selected_resources(sub_snapshots: &[ResourceSnapshot]) -> Vec<ClusterWideKey> {
    let mut keys = BTreeSet::new();
    for snapshot in sub_snapshots {
        for manifest in &snapshot.manifests {
            if let Ok(key) = crate::work_generator::cluster_wide_key_of(manifest) {
                keys.insert(key);
            }
        }
    }
    keys.into_iter().collect()
}

/// One selected cluster's full condition chain plus its failed placements.
pub struct SelectedClusterStatus {
    pub cluster_name: String,
    pub conditions: Vec<Condition>,
    pub failed_placements: Vec<FailedResourcePlacement>,
}

/// Builds `PlacementStatus.placementStatuses` (§4.F): one entry per selected
/// cluster, plus -- only for `PickN`/`PickFixed` -- explanatory entries for
/// unmet targets or missing fixed names, so the user can see why (§4.F,
/// scenario 2).
pub fn build_placement_statuses(
    selected: Vec<SelectedClusterStatus>,
    policy: &PlacementPolicy,
    unmet_count: u32,
    missing_fixed_names: &[String],
) -> Vec<ClusterPlacementStatus> {
    let mut statuses: Vec<ClusterPlacementStatus> = selected
        .into_iter()
        .map(|s| ClusterPlacementStatus {
            cluster_name: Some(s.cluster_name),
            conditions: s.conditions,
            failed_placements: s.failed_placements,
        })
        .collect();

    match policy {
        PlacementPolicy::PickN { .. } => {
            for _ in 0..unmet_count {
                statuses.push(ClusterPlacementStatus {
                    cluster_name: None,
                    conditions: vec![Condition::new(
                        ConditionType::Scheduled,
                        fleet_core::condition::ConditionStatus::False,
                        "ResourceScheduleFailed",
                        0,
                    )],
                    failed_placements: vec![],
                });
            }
        }
        PlacementPolicy::PickFixed { .. } => {
            for name in missing_fixed_names {
                statuses.push(ClusterPlacementStatus {
                    cluster_name: Some(name.clone()),
                    conditions: vec![Condition::new(
                        ConditionType::Scheduled,
                        fleet_core::condition::ConditionStatus::False,
                        "ResourceScheduleFailed",
                        0,
                    )],
                    failed_placements: vec![],
                });
            }
        }
        PlacementPolicy::PickAll => {}
    }

    statuses
}

/// The fixed `(true, false, unknown)` reason triple for each rank, used by
/// [`top_level_conditions`] (§4.B, §6).
fn reasons_for_rank(rank: usize) -> (RollupReason, RollupReason, RollupReason) {
    match ConditionType::ALL[rank] {
        ConditionType::Scheduled => (
            RollupReason::FullyScheduled,
            RollupReason::NotFullyScheduled,
            RollupReason::NotFullyScheduled,
        ),
        ConditionType::RolloutStarted => (
            RollupReason::RolloutStartedReason,
            RollupReason::RolloutNotStartedYet,
            RollupReason::RolloutNotStartedYet,
        ),
        ConditionType::Overridden => (
            RollupReason::OverriddenSucceeded,
            RollupReason::OverriddenFailed,
            RollupReason::OverrideNotSpecified,
        ),
        ConditionType::WorkSynchronized => (
            RollupReason::WorkSynchronized,
            RollupReason::SyncWorkFailed,
            RollupReason::WorkNotSynchronizedYet,
        ),
        ConditionType::Applied => (
            RollupReason::AllWorkApplied,
            RollupReason::WorkNotApplied,
            RollupReason::WorkNotApplied,
        ),
        ConditionType::Available => (
            RollupReason::AllWorkAvailable,
            RollupReason::WorkNotAvailable,
            RollupReason::NotAvailableYet,
        ),
    }
}

/// Rolls every selected cluster's per-rank condition up into the top-level
/// CRP conditions, then applies rank masking so a low-rank failure is never
/// followed by a later-stage report (§4.B, §9 "Observed ambiguity": an empty
/// `SelectedClusters` list is a deliberate contract, not a bug -- only
/// `Scheduled` is ever emitted, and it is `False` since nothing was placed).
pub fn top_level_conditions(per_cluster_chains: &[Vec<Condition>], crp_generation: i64) -> Vec<Condition> {
    if per_cluster_chains.is_empty() {
        return vec![Condition::new(
            ConditionType::Scheduled,
            fleet_core::condition::ConditionStatus::False,
            RollupReason::NotFullyScheduled.as_str(),
            crp_generation,
        )];
    }

    let all_children: Vec<Condition> = per_cluster_chains.iter().flatten().cloned().collect();

    let mut chain = ConditionChain::new();
    let now = time::OffsetDateTime::UNIX_EPOCH;
    for rank in 0..fleet_core::condition::ConditionType::ALL.len() {
        let (reason_true, reason_false, reason_unknown) = reasons_for_rank(rank);
        let condition = rollup(&all_children, rank, crp_generation, reason_true, reason_false, reason_unknown);
        chain.set(condition, now);
    }
    chain.apply_rank_mask();
    chain.into()
}

#[cfg(test)]
mod tests {
    use fleet_core::condition::ConditionStatus;

    use super::*;

    fn cond(type_: ConditionType, status: ConditionStatus) -> Condition {
        Condition::new(type_, status, "Reason", 1)
    }

    #[test]
    fn pick_n_unmet_adds_explanatory_entries_without_cluster_name() {
        let policy = PlacementPolicy::PickN {
            n: 5,
            affinity: Default::default(),
            topology_spread: vec![],
            tolerations: vec![],
        };
        let statuses = build_placement_statuses(vec![], &policy, 2, &[]);
        assert_eq!(statuses.len(), 2);
        assert!(statuses.iter().all(|s| s.cluster_name.is_none()));
    }

    #[test]
    fn pick_fixed_missing_names_are_reported_with_name() {
        let policy = PlacementPolicy::PickFixed {
            cluster_names: vec!["ghost".to_string()],
        };
        let statuses = build_placement_statuses(vec![], &policy, 0, &["ghost".to_string()]);
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].cluster_name.as_deref(), Some("ghost"));
    }

    #[test]
    fn all_clusters_true_rolls_up_to_true_and_keeps_full_chain() {
        let chains = vec![
            vec![
                cond(ConditionType::Scheduled, ConditionStatus::True),
                cond(ConditionType::RolloutStarted, ConditionStatus::True),
                cond(ConditionType::Overridden, ConditionStatus::True),
                cond(ConditionType::WorkSynchronized, ConditionStatus::True),
                cond(ConditionType::Applied, ConditionStatus::True),
                cond(ConditionType::Available, ConditionStatus::True),
            ],
            vec![
                cond(ConditionType::Scheduled, ConditionStatus::True),
                cond(ConditionType::RolloutStarted, ConditionStatus::True),
                cond(ConditionType::Overridden, ConditionStatus::True),
                cond(ConditionType::WorkSynchronized, ConditionStatus::True),
                cond(ConditionType::Applied, ConditionStatus::True),
                cond(ConditionType::Available, ConditionStatus::True),
            ],
        ];

        let top = top_level_conditions(&chains, 1);
        assert_eq!(top.len(), 6);
        assert!(top.iter().all(|c| c.status == ConditionStatus::True));
    }

    #[test]
    fn scheduled_false_masks_every_later_rank() {
        let chains = vec![vec![cond(ConditionType::Scheduled, ConditionStatus::False)]];
        let top = top_level_conditions(&chains, 1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].type_, ConditionType::Scheduled);
        assert_eq!(top[0].status, ConditionStatus::False);
    }

    #[test]
    fn empty_selected_clusters_emits_only_scheduled_false() {
        let top = top_level_conditions(&[], 1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].type_, ConditionType::Scheduled);
        assert_eq!(top[0].status, ConditionStatus::False);
        assert_eq!(top[0].reason, RollupReason::NotFullyScheduled.as_str());
    }
}
