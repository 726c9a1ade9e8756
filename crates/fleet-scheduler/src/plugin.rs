//! The plugin contract (§4.C, §9 "Plugin polymorphism"): extension points are
//! invoked in a fixed order for every `(snapshot, cluster)` pair, and each
//! hook returns a tagged result rather than using exception control flow, so
//! the scheduler loop is a simple fold over hooks.

use fleet_core::model::{ClusterAffinity, Toleration, TopologySpreadConstraint};

/// The outcome of invoking one plugin hook (§4.C, §9).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HookResult<T = ()> {
    Success(T),
    /// The plugin opts out for this cycle; treated as if it were absent.
    Skip,
    /// The cluster is rejected; short-circuits remaining Filter hooks (Filter
    /// hooks only).
    Unschedulable { reason: String },
    /// Plugin failure. `retryable` selects the §4.C failure semantics:
    /// requeue with backoff, or mark the snapshot permanently failed.
    Error { message: String, retryable: bool },
}

impl<T> HookResult<T> {
    pub const fn is_unschedulable(&self) -> bool {
        matches!(self, HookResult::Unschedulable { .. })
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, HookResult::Error { .. })
    }
}

/// One member cluster as seen by the scheduling framework: its name, labels
/// (for affinity/topology-spread match expressions) and taints (for
/// tolerations). The membership/identity model itself is out of scope (§1
/// Non-goals); this is only the shape the framework needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cluster {
    pub name: String,
    pub labels: std::collections::BTreeMap<String, String>,
    pub taints: Vec<String>,
}

/// Per-cycle context threaded through every hook invocation: the
/// already-placed clusters (for `PostBatch`'s batch-size computation and
/// topology-spread skew accounting) and the policy fields each built-in
/// plugin reads.
#[derive(Clone, Debug)]
pub struct SchedulingContext<'a> {
    pub already_placed: &'a [Cluster],
    pub affinity: Option<&'a ClusterAffinity>,
    pub topology_spread: &'a [TopologySpreadConstraint],
    pub tolerations: &'a [Toleration],
}

/// A scheduling plugin implements any subset of these hooks; hooks it does
/// not implement default to [`HookResult::Skip`] (§4.C: "implements any
/// subset of hooks").
pub trait Plugin {
    fn name(&self) -> &'static str;

    /// Computes a contribution to the batch size for this cycle (§4.C step
    /// 2). The framework sums all plugins' contributions and clamps to
    /// `n - already_placed` for `PickN`.
    fn post_batch(&self, _ctx: &SchedulingContext<'_>) -> HookResult<Option<u32>> {
        HookResult::Skip
    }

    fn pre_filter(&self, _ctx: &SchedulingContext<'_>) -> HookResult {
        HookResult::Skip
    }

    fn filter(&self, _ctx: &SchedulingContext<'_>, _cluster: &Cluster) -> HookResult {
        HookResult::Skip
    }

    fn post_filter(&self, _ctx: &SchedulingContext<'_>, _survivors: &[&Cluster]) -> HookResult {
        HookResult::Skip
    }

    fn pre_score(&self, _ctx: &SchedulingContext<'_>) -> HookResult {
        HookResult::Skip
    }

    /// Raw score contribution for `cluster`; may be negative (§4.C: "Weights
    /// may be negative"). Clamped to `[min_score, max_score]` by the
    /// framework before normalization.
    fn score(&self, _ctx: &SchedulingContext<'_>, _cluster: &Cluster) -> HookResult<i32> {
        HookResult::Skip
    }

    /// Normalizes this plugin's raw scores across all surviving clusters into
    /// a fixed integer range (§4.C step 4). Defaults to the framework's
    /// shared min-max normalization (ties map to the top of the range) so a
    /// plugin only needs to override this when it wants different spread
    /// behavior.
    fn normalize_score(
        &self,
        _ctx: &SchedulingContext<'_>,
        raw_scores: &std::collections::BTreeMap<String, i32>,
    ) -> HookResult<std::collections::BTreeMap<String, i32>> {
        HookResult::Success(crate::framework::minmax_normalize(raw_scores))
    }
}
