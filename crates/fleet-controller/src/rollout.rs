//! The Rollout Controller (§4.D): derives target bindings from the latest
//! scheduling decision and resource snapshot, and gates `Scheduled → Bound`
//! admission by the rollout strategy's surge/unavailability budget.

use fleet_core::model::{BindingState, ClusterDecision, IntOrPercent, ResourceBinding, Rounding};
use time::OffsetDateTime;

/// The binding-set changes needed to match the current decision set (§4.D
/// point 1).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BindingSync {
    /// Newly selected clusters with no existing binding; created in
    /// `Scheduled` state.
    pub to_create: Vec<String>,
    /// Existing `Bound`/`Scheduled` bindings whose cluster is no longer
    /// selected; moved to `Unscheduled`, never deleted directly (§4.D:
    /// "retained for graceful drain").
    pub to_unschedule: Vec<String>,
}

/// Computes the binding-set delta for the current decision set (§4.D point
/// 1). `existing` is keyed by target cluster name for bindings that are not
/// already `Unscheduled`.
pub fn sync_bindings(decisions: &[ClusterDecision], existing: &[ResourceBinding]) -> BindingSync {
    let selected: std::collections::BTreeSet<&str> = decisions
        .iter()
        .filter(|d| d.selected)
        .map(|d| d.cluster_name.as_str())
        .collect();

    let active_clusters: std::collections::BTreeSet<&str> = existing
        .iter()
        .filter(|b| b.state != BindingState::Unscheduled)
        .map(|b| b.target_cluster.as_str())
        .collect();

    let to_create = selected
        .iter()
        .filter(|c| !active_clusters.contains(*c))
        .map(|c| c.to_string())
        .collect();

    let to_unschedule = existing
        .iter()
        .filter(|b| b.state != BindingState::Unscheduled && !selected.contains(b.target_cluster.as_str()))
        .map(|b| b.name.clone())
        .collect();

    BindingSync {
        to_create,
        to_unschedule,
    }
}

/// Whether `binding` currently counts against the unavailability budget:
/// either it isn't `Available=True`, or it transitioned to available
/// recently enough to still be within its dwell window (§4.D points 2-3).
fn counts_as_unavailable(binding: &ResourceBinding, now: OffsetDateTime, unavailable_period_seconds: u32) -> bool {
    let available = binding
        .conditions
        .iter()
        .find(|c| c.type_ == fleet_core::condition::ConditionType::Available);

    let is_available_true = matches!(
        available,
        Some(c) if c.status == fleet_core::condition::ConditionStatus::True
    );

    !is_available_true || binding.is_recently_rolled(now, unavailable_period_seconds)
}

/// Rollout admission gate (§4.D point 2): a binding may advance
/// `Scheduled → Bound` only if `unavailable + inFlight ≤
/// maxUnavailable(target)` and `total ≤ target + maxSurge`.
pub fn admits_another_bound(
    bindings: &[ResourceBinding],
    target: u32,
    max_surge: &IntOrPercent,
    max_unavailable: &IntOrPercent,
    unavailable_period_seconds: u32,
    now: OffsetDateTime,
    in_flight: u32,
) -> bool {
    let unavailable = bindings
        .iter()
        .filter(|b| b.state != BindingState::Unscheduled)
        .filter(|b| counts_as_unavailable(b, now, unavailable_period_seconds))
        .count() as u32;

    let total = bindings
        .iter()
        .filter(|b| b.state != BindingState::Unscheduled)
        .count() as u32;

    let max_unavailable = max_unavailable.resolve(target, Rounding::Down);
    let max_surge = max_surge.resolve(target, Rounding::Up);

    unavailable + in_flight <= max_unavailable && total <= target + max_surge
}

/// Rollout stuck detection (§4.D point 4): no binding has changed state
/// within `threshold` and targets remain unmet.
pub fn is_rollout_stuck(
    last_state_change: Option<OffsetDateTime>,
    now: OffsetDateTime,
    threshold: time::Duration,
    targets_met: bool,
) -> bool {
    if targets_met {
        return false;
    }
    match last_state_change {
        Some(t) => now - t >= threshold,
        None => true,
    }
}
