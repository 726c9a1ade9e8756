//! The scheduling framework's per-cycle algorithm (§4.C).
//!
//! `PostBatch → PreFilter → Filter → PostFilter → PreScore → Score →
//! NormalizeScore` is folded over every `(snapshot, cluster)` pair; Score
//! contributions are clamped then min-max normalized per plugin before being
//! summed into the two fixed [`ClusterScore`] fields, matching the data
//! model's `{topology, affinity}` shape.

use std::collections::BTreeMap;

use fleet_core::model::{ClusterDecision, ClusterScore, PlacementPolicy, sort_decisions};

use crate::{
    error::SchedulerError,
    inventory::ClusterInventory,
    plugin::{Cluster, HookResult, Plugin, SchedulingContext},
    plugins::{AffinityPlugin, PickFixedPlugin, TolerationsPlugin, TopologySpreadPlugin},
};

/// Default cap on clusters placed per cycle for `PickN`, used by `PostBatch`
/// (§4.C step 2) absent an explicit override.
pub const DEFAULT_MAX_BATCH_PER_CYCLE: u32 = 50;

/// Raw plugin scores are clamped to this range before normalization (§4.C:
/// "plugin Score outputs are clamped to `[minScore, maxScore]`").
const MIN_SCORE: i32 = -100;
const MAX_SCORE: i32 = 100;

/// The result of one scheduling cycle (§4.C step 6, §4.F).
#[derive(Clone, Debug, Default)]
pub struct ScheduleOutcome {
    /// All decisions (selected and rejected), sorted deterministically by
    /// `(-score, clusterName)` (§4.C step 5, testable property 6).
    pub decisions: Vec<ClusterDecision>,
    pub fully_scheduled: bool,
    /// For `PickN`: how many of the requested `n` remain unfilled after this
    /// cycle (§4.F "PickN (unmet count)").
    pub unmet_count: u32,
    /// For `PickFixed`: names from the policy's `clusterNames` that have no
    /// corresponding inventory entry (§4.F "PickFixed (missing name)").
    pub missing_fixed_names: Vec<String>,
}

fn clamp_score(raw: i32) -> i32 {
    raw.clamp(MIN_SCORE, MAX_SCORE)
}

/// Min-max normalizes `raw` into `0..=100`. Ties (including the
/// single-cluster and all-equal cases) all map to `100`, so a plugin that
/// never differentiates clusters never penalizes them. This is the shared
/// default body of [`Plugin::normalize_score`] (§4.C step 4).
pub(crate) fn minmax_normalize(raw: &BTreeMap<String, i32>) -> BTreeMap<String, i32> {
    let Some(min) = raw.values().copied().min() else {
        return BTreeMap::new();
    };
    let max = raw.values().copied().max().unwrap_or(min);

    raw.iter()
        .map(|(name, value)| {
            let normalized = if max == min {
                100
            } else {
                ((value - min) as i64 * 100 / (max - min) as i64) as i32
            };
            (name.clone(), normalized)
        })
        .collect()
}

/// Runs `PostBatch` (§4.C step 2) across `plugins`, folding each plugin's
/// contribution into `default_batch` via `min` so a plugin can only shrink
/// the batch size, never grow it past what the policy itself allows.
fn run_post_batch(
    ctx: &SchedulingContext<'_>,
    plugins: &[&dyn Plugin],
    default_batch: u32,
) -> Result<u32, SchedulerError> {
    let mut batch = default_batch;
    for plugin in plugins {
        match plugin.post_batch(ctx) {
            HookResult::Success(Some(contribution)) => batch = batch.min(contribution),
            HookResult::Success(None) | HookResult::Skip => {}
            HookResult::Unschedulable { .. } => unreachable!("PostBatch never rejects a cluster"),
            HookResult::Error { message, retryable } => {
                return Err(SchedulerError::Plugin {
                    plugin: plugin.name(),
                    message,
                    retryable,
                });
            }
        }
    }
    Ok(batch)
}

/// Runs a cycle-wide (non-per-cluster) hook -- `PreFilter` or `PostFilter`
/// (§4.C) -- across `plugins`. An `Unschedulable` from any plugin vetoes the
/// whole cycle: the caller treats every candidate cluster as rejected with
/// that reason.
fn run_cycle_veto_hook(
    plugins: &[&dyn Plugin],
    mut call: impl FnMut(&dyn Plugin) -> HookResult,
) -> Result<Option<String>, SchedulerError> {
    for plugin in plugins {
        match call(*plugin) {
            HookResult::Success(()) | HookResult::Skip => continue,
            HookResult::Unschedulable { reason } => return Ok(Some(reason)),
            HookResult::Error { message, retryable } => {
                return Err(SchedulerError::Plugin {
                    plugin: plugin.name(),
                    message,
                    retryable,
                });
            }
        }
    }
    Ok(None)
}

/// Runs `PreScore` (§4.C) across `plugins`. Scoring itself is never vetoed by
/// this hook, only aborted on plugin error.
fn run_pre_score(ctx: &SchedulingContext<'_>, plugins: &[&dyn Plugin]) -> Result<(), SchedulerError> {
    for plugin in plugins {
        if let HookResult::Error { message, retryable } = plugin.pre_score(ctx) {
            return Err(SchedulerError::Plugin {
                plugin: plugin.name(),
                message,
                retryable,
            });
        }
    }
    Ok(())
}

fn run_filters(
    ctx: &SchedulingContext<'_>,
    cluster: &Cluster,
    filters: &[&dyn Plugin],
) -> Result<Option<String>, SchedulerError> {
    for plugin in filters {
        match plugin.filter(ctx, cluster) {
            HookResult::Success(()) | HookResult::Skip => continue,
            HookResult::Unschedulable { reason } => return Ok(Some(reason)),
            HookResult::Error { message, retryable } => {
                return Err(SchedulerError::Plugin {
                    plugin: plugin.name(),
                    message,
                    retryable,
                });
            }
        }
    }
    Ok(None)
}

fn run_scorer(
    ctx: &SchedulingContext<'_>,
    survivors: &[&Cluster],
    plugin: &dyn Plugin,
) -> Result<BTreeMap<String, i32>, SchedulerError> {
    let mut raw = BTreeMap::new();
    for cluster in survivors {
        match plugin.score(ctx, cluster) {
            HookResult::Success(score) => {
                raw.insert(cluster.name.clone(), clamp_score(score));
            }
            HookResult::Skip => {
                raw.insert(cluster.name.clone(), 0);
            }
            HookResult::Unschedulable { .. } => unreachable!("Score hooks never reject a cluster"),
            HookResult::Error { message, retryable } => {
                return Err(SchedulerError::Plugin {
                    plugin: plugin.name(),
                    message,
                    retryable,
                });
            }
        }
    }
    Ok(raw)
}

/// Runs `NormalizeScore` (§4.C step 4) for one scorer plugin.
fn run_normalize(
    ctx: &SchedulingContext<'_>,
    plugin: &dyn Plugin,
    raw: &BTreeMap<String, i32>,
) -> Result<BTreeMap<String, i32>, SchedulerError> {
    match plugin.normalize_score(ctx, raw) {
        HookResult::Success(normalized) => Ok(normalized),
        HookResult::Skip => Ok(raw.clone()),
        HookResult::Unschedulable { .. } => unreachable!("NormalizeScore never rejects a cluster"),
        HookResult::Error { message, retryable } => Err(SchedulerError::Plugin {
            plugin: plugin.name(),
            message,
            retryable,
        }),
    }
}

/// Runs one scheduling cycle for a `PickN`/`PickAll`/`PickFixed` policy
/// against `inventory`, producing decisions for every inventory cluster
/// (§4.C steps 2-6).
pub fn schedule(
    policy: &PlacementPolicy,
    already_placed: &[Cluster],
    inventory: &ClusterInventory,
) -> Result<ScheduleOutcome, SchedulerError> {
    let (affinity, topology_spread, tolerations, fixed_names): (
        Option<&fleet_core::model::ClusterAffinity>,
        &[fleet_core::model::TopologySpreadConstraint],
        &[fleet_core::model::Toleration],
        Option<&[String]>,
    ) = match policy {
        PlacementPolicy::PickAll => (None, &[], &[], None),
        PlacementPolicy::PickN {
            affinity,
            topology_spread,
            tolerations,
            ..
        } => (Some(affinity), topology_spread, tolerations, None),
        PlacementPolicy::PickFixed { cluster_names } => (None, &[], &[], Some(cluster_names)),
    };

    let ctx = SchedulingContext {
        already_placed,
        affinity,
        topology_spread,
        tolerations,
    };

    let affinity_plugin = AffinityPlugin;
    let toleration_plugin = TolerationsPlugin;
    let pick_fixed_plugin = fixed_names.map(|cluster_names| PickFixedPlugin { cluster_names });
    let topology_plugin = TopologySpreadPlugin;

    let mut filters: Vec<&dyn Plugin> = vec![&affinity_plugin, &toleration_plugin];
    if let Some(plugin) = &pick_fixed_plugin {
        filters.push(plugin);
    }
    // Cycle-wide hooks (PostBatch, PreFilter, PostFilter, PreScore) are not
    // tied to a single stage, so every plugin in play gets a turn.
    let mut all_plugins: Vec<&dyn Plugin> = vec![&affinity_plugin, &toleration_plugin, &topology_plugin];
    if let Some(plugin) = &pick_fixed_plugin {
        all_plugins.push(plugin);
    }

    // Step 2: PostBatch. Only PickN has a batch concept; other policies pass
    // an unused placeholder through untouched.
    let default_batch = match policy {
        PlacementPolicy::PickN { n, .. } => {
            n.saturating_sub(already_placed.len() as u32).min(DEFAULT_MAX_BATCH_PER_CYCLE)
        }
        PlacementPolicy::PickAll | PlacementPolicy::PickFixed { .. } => 0,
    };
    let batch = run_post_batch(&ctx, &all_plugins, default_batch)?;

    // Step 3: PreFilter → Filter → PostFilter.
    let pre_filter_veto = run_cycle_veto_hook(&all_plugins, |plugin| plugin.pre_filter(&ctx))?;

    let mut survivors = Vec::new();
    let mut rejected: Vec<(&Cluster, String)> = Vec::new();
    if let Some(reason) = &pre_filter_veto {
        rejected.extend(inventory.iter().map(|cluster| (cluster, reason.clone())));
    } else {
        for cluster in inventory.iter() {
            match run_filters(&ctx, cluster, &filters)? {
                None => survivors.push(cluster),
                Some(reason) => rejected.push((cluster, reason)),
            }
        }

        let survivor_refs: Vec<&Cluster> = survivors.clone();
        if let Some(reason) = run_cycle_veto_hook(&all_plugins, |plugin| plugin.post_filter(&ctx, &survivor_refs))? {
            rejected.extend(survivors.drain(..).map(|cluster| (cluster, reason.clone())));
        }
    }

    // Step 4: PreScore → Score → NormalizeScore.
    run_pre_score(&ctx, &all_plugins)?;
    let raw_affinity = run_scorer(&ctx, &survivors, &affinity_plugin)?;
    let raw_topology = run_scorer(&ctx, &survivors, &topology_plugin)?;
    let normalized_affinity = run_normalize(&ctx, &affinity_plugin, &raw_affinity)?;
    let normalized_topology = run_normalize(&ctx, &topology_plugin, &raw_topology)?;

    let score_for = |name: &str| ClusterScore {
        topology: normalized_topology.get(name).copied().unwrap_or(0),
        affinity: normalized_affinity.get(name).copied().unwrap_or(0),
    };

    let mut decisions: Vec<ClusterDecision> = survivors
        .iter()
        .map(|cluster| ClusterDecision {
            cluster_name: cluster.name.clone(),
            selected: false,
            score: score_for(&cluster.name),
            reason: String::new(),
        })
        .collect();
    sort_decisions(&mut decisions);

    let (selected_count, unmet_count, missing_fixed_names) = match policy {
        PlacementPolicy::PickAll => {
            for decision in &mut decisions {
                decision.selected = true;
                decision.reason = "PickAll".to_string();
            }
            (decisions.len() as u32, 0, Vec::new())
        }
        PlacementPolicy::PickN { n, .. } => {
            let selected = batch.min(decisions.len() as u32) as usize;
            for decision in decisions.iter_mut().take(selected) {
                decision.selected = true;
                decision.reason = "PickN".to_string();
            }
            let unmet = n.saturating_sub(selected as u32);
            (selected as u32, unmet, Vec::new())
        }
        PlacementPolicy::PickFixed { cluster_names } => {
            for decision in &mut decisions {
                decision.selected = true;
                decision.reason = "PickFixed".to_string();
            }
            let missing: Vec<String> = cluster_names
                .iter()
                .filter(|name| inventory.get(name).is_none())
                .cloned()
                .collect();
            (decisions.len() as u32, 0, missing)
        }
    };

    for (cluster, reason) in &rejected {
        decisions.push(ClusterDecision {
            cluster_name: cluster.name.clone(),
            selected: false,
            score: ClusterScore::default(),
            reason: reason.clone(),
        });
    }
    sort_decisions(&mut decisions);

    let fully_scheduled = match policy {
        PlacementPolicy::PickAll => true,
        PlacementPolicy::PickN { n, .. } => selected_count >= *n,
        PlacementPolicy::PickFixed { .. } => missing_fixed_names.is_empty(),
    };

    Ok(ScheduleOutcome {
        decisions,
        fully_scheduled,
        unmet_count,
        missing_fixed_names,
    })
}

#[cfg(test)]
mod tests {
    use fleet_core::model::PlacementPolicy;

    use super::*;

    fn cluster(name: &str) -> Cluster {
        Cluster {
            name: name.into(),
            labels: BTreeMap::new(),
            taints: vec![],
        }
    }

    #[test]
    fn pick_all_selects_every_inventory_cluster() {
        let inventory = ClusterInventory::new(vec![cluster("a"), cluster("b"), cluster("c")]);
        let outcome = schedule(&PlacementPolicy::PickAll, &[], &inventory).unwrap();

        assert!(outcome.fully_scheduled);
        assert_eq!(outcome.decisions.len(), 3);
        assert!(outcome.decisions.iter().all(|d| d.selected));
    }

    #[test]
    fn pick_n_underfill_leaves_unmet_count_and_no_selected_for_missing() {
        let inventory = ClusterInventory::new(vec![cluster("a"), cluster("b"), cluster("c")]);
        let policy = PlacementPolicy::PickN {
            n: 5,
            affinity: Default::default(),
            topology_spread: vec![],
            tolerations: vec![],
        };

        let outcome = schedule(&policy, &[], &inventory).unwrap();

        assert!(!outcome.fully_scheduled);
        assert_eq!(outcome.unmet_count, 2);
        assert_eq!(outcome.decisions.iter().filter(|d| d.selected).count(), 3);
    }

    #[test]
    fn pick_fixed_reports_missing_names() {
        let inventory = ClusterInventory::new(vec![cluster("a")]);
        let policy = PlacementPolicy::PickFixed {
            cluster_names: vec!["a".into(), "ghost".into()],
        };

        let outcome = schedule(&policy, &[], &inventory).unwrap();

        assert!(!outcome.fully_scheduled);
        assert_eq!(outcome.missing_fixed_names, vec!["ghost".to_string()]);
    }

    #[test]
    fn tie_break_is_deterministic_across_repeated_runs() {
        let inventory = ClusterInventory::new(vec![cluster("b"), cluster("a"), cluster("c")]);
        let policy = PlacementPolicy::PickAll;

        let first = schedule(&policy, &[], &inventory).unwrap();
        let second = schedule(&policy, &[], &inventory).unwrap();

        let first_names: Vec<_> = first.decisions.iter().map(|d| d.cluster_name.clone()).collect();
        let second_names: Vec<_> = second.decisions.iter().map(|d| d.cluster_name.clone()).collect();
        assert_eq!(first_names, second_names);
        assert_eq!(first_names, vec!["a", "b", "c"]);
    }

    #[test]
    fn pick_n_batch_accounts_for_already_placed() {
        let inventory = ClusterInventory::new(vec![cluster("a"), cluster("b"), cluster("c")]);
        let policy = PlacementPolicy::PickN {
            n: 5,
            affinity: Default::default(),
            topology_spread: vec![],
            tolerations: vec![],
        };
        let placed = vec![cluster("x"), cluster("y"), cluster("z"), cluster("w")];

        let outcome = schedule(&policy, &placed, &inventory).unwrap();

        // n=5, already_placed=4, so the batch for this cycle is capped at 1,
        // not the full 3-cluster inventory.
        assert_eq!(outcome.decisions.iter().filter(|d| d.selected).count(), 1);
        assert_eq!(outcome.unmet_count, 4);
    }

    struct VetoPlugin {
        phase: &'static str,
    }

    impl Plugin for VetoPlugin {
        fn name(&self) -> &'static str {
            "veto"
        }

        fn pre_filter(&self, _ctx: &SchedulingContext<'_>) -> HookResult {
            if self.phase == "pre_filter" {
                HookResult::Unschedulable {
                    reason: "vetoed in PreFilter".to_string(),
                }
            } else {
                HookResult::Skip
            }
        }

        fn post_filter(&self, _ctx: &SchedulingContext<'_>, _survivors: &[&Cluster]) -> HookResult {
            if self.phase == "post_filter" {
                HookResult::Unschedulable {
                    reason: "vetoed in PostFilter".to_string(),
                }
            } else {
                HookResult::Skip
            }
        }
    }

    #[test]
    fn pre_filter_veto_rejects_every_cluster() {
        let plugins: Vec<&dyn Plugin> = vec![&VetoPlugin { phase: "pre_filter" }];
        let ctx = SchedulingContext {
            already_placed: &[],
            affinity: None,
            topology_spread: &[],
            tolerations: &[],
        };
        let reason = run_cycle_veto_hook(&plugins, |plugin| plugin.pre_filter(&ctx)).unwrap();
        assert_eq!(reason, Some("vetoed in PreFilter".to_string()));
    }

    #[test]
    fn post_filter_veto_rejects_survivors() {
        let plugins: Vec<&dyn Plugin> = vec![&VetoPlugin { phase: "post_filter" }];
        let ctx = SchedulingContext {
            already_placed: &[],
            affinity: None,
            topology_spread: &[],
            tolerations: &[],
        };
        let survivors: Vec<&Cluster> = vec![];
        let reason = run_cycle_veto_hook(&plugins, |plugin| plugin.post_filter(&ctx, &survivors)).unwrap();
        assert_eq!(reason, Some("vetoed in PostFilter".to_string()));
    }

    struct BatchCapPlugin;

    impl Plugin for BatchCapPlugin {
        fn name(&self) -> &'static str {
            "batch_cap"
        }

        fn post_batch(&self, _ctx: &SchedulingContext<'_>) -> HookResult<Option<u32>> {
            HookResult::Success(Some(1))
        }
    }

    #[test]
    fn post_batch_hook_can_shrink_the_default_batch() {
        let ctx = SchedulingContext {
            already_placed: &[],
            affinity: None,
            topology_spread: &[],
            tolerations: &[],
        };
        let plugins: Vec<&dyn Plugin> = vec![&BatchCapPlugin];
        let batch = run_post_batch(&ctx, &plugins, 10).unwrap();
        assert_eq!(batch, 1);
    }

    #[test]
    fn normalize_score_hook_is_invoked_for_scoring() {
        let ctx = SchedulingContext {
            already_placed: &[],
            affinity: None,
            topology_spread: &[],
            tolerations: &[],
        };
        let mut raw = BTreeMap::new();
        raw.insert("a".to_string(), 10);
        raw.insert("b".to_string(), 20);
        let plugin = AffinityPlugin;
        let normalized = run_normalize(&ctx, &plugin, &raw).unwrap();
        assert_eq!(normalized.get("a"), Some(&0));
        assert_eq!(normalized.get("b"), Some(&100));
    }

    #[test]
    fn toleration_rejects_untolerated_taint() {
        let mut tainted = cluster("tainted");
        tainted.taints = vec!["dedicated=gpu".to_string()];
        let inventory = ClusterInventory::new(vec![cluster("clean"), tainted]);

        let outcome = schedule(&PlacementPolicy::PickAll, &[], &inventory).unwrap();

        let tainted_decision = outcome
            .decisions
            .iter()
            .find(|d| d.cluster_name == "tainted")
            .unwrap();
        assert!(!tainted_decision.selected);
    }
}
