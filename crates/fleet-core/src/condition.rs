//! The typed condition chain and its rollup algebra (§4.B).
//!
//! A condition chain is a fixed-rank table: `Scheduled(0) < RolloutStarted(1)
//! < Overridden(2) < WorkSynchronized(3) < Applied(4) < Available(5)`. Lower
//! rank failures mask higher rank reports, and rollup from N children to one
//! parent condition at a given rank is a pure function of the children plus
//! the parent's `generation` -- trivially testable in isolation (§9).

use std::fmt::{self, Display};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::EnumCount;
use time::OffsetDateTime;

/// One position in the six-stage condition chain (§4.B). Variant order is
/// also rank order: `Scheduled` is rank 0, `Available` is rank 5.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, EnumCount, Eq, Hash, JsonSchema, PartialEq, Serialize,
)]
#[serde(rename_all = "PascalCase")]
pub enum ConditionType {
    #[default]
    Scheduled,
    RolloutStarted,
    Overridden,
    WorkSynchronized,
    Applied,
    Available,
}

impl ConditionType {
    /// The chain position used by [`rank_mask`] and the rollup reason table.
    /// Fixed and load-bearing: do not reorder (§4.B).
    pub const fn rank(self) -> usize {
        match self {
            ConditionType::Scheduled => 0,
            ConditionType::RolloutStarted => 1,
            ConditionType::Overridden => 2,
            ConditionType::WorkSynchronized => 3,
            ConditionType::Applied => 4,
            ConditionType::Available => 5,
        }
    }

    /// All chain types, in rank order.
    pub const ALL: [ConditionType; ConditionType::COUNT] = [
        ConditionType::Scheduled,
        ConditionType::RolloutStarted,
        ConditionType::Overridden,
        ConditionType::WorkSynchronized,
        ConditionType::Applied,
        ConditionType::Available,
    ];
}

impl Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConditionType::Scheduled => "Scheduled",
            ConditionType::RolloutStarted => "RolloutStarted",
            ConditionType::Overridden => "Overridden",
            ConditionType::WorkSynchronized => "WorkSynchronized",
            ConditionType::Applied => "Applied",
            ConditionType::Available => "Available",
        };
        f.write_str(name)
    }
}

/// Status of a [`Condition`], mirroring the Kubernetes tri-state convention.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, JsonSchema, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "PascalCase")]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

/// A single entry in a condition chain (§4.B, §6).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: ConditionType,
    pub status: ConditionStatus,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub observed_generation: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<OffsetDateTime>,
}

impl Condition {
    pub fn new(
        type_: ConditionType,
        status: ConditionStatus,
        reason: impl Into<String>,
        observed_generation: i64,
    ) -> Self {
        Self {
            type_,
            status,
            reason: reason.into(),
            message: None,
            observed_generation,
            last_transition_time: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// An ordered, rank-indexed chain of conditions for one object (CRP,
/// per-cluster placement, or Work manifest).
///
/// Internally a fixed-size array indexed by [`ConditionType::rank`], the same
/// "quasi-set" trick the teacher's `ClusterConditionSet` uses to prevent a
/// condition from ever being stored under the wrong rank.
#[derive(Clone, Debug, Default)]
pub struct ConditionChain {
    slots: [Option<Condition>; ConditionType::COUNT],
}

impl ConditionChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, type_: ConditionType) -> Option<&Condition> {
        self.slots[type_.rank()].as_ref()
    }

    /// Sets a condition, preserving `lastTransitionTime` when `(status,
    /// reason)` are unchanged relative to the previous value at this rank
    /// (§4.B monotonicity), and stamping `now` as the transition time
    /// otherwise.
    pub fn set(&mut self, mut condition: Condition, now: OffsetDateTime) {
        let rank = condition.type_.rank();
        condition.last_transition_time = match &self.slots[rank] {
            Some(prev) if prev.status == condition.status && prev.reason == condition.reason => {
                prev.last_transition_time
            }
            _ => Some(now),
        };
        self.slots[rank] = Some(condition);
    }

    /// Enforces rank masking: once a condition is explicitly `False`, every
    /// condition at a higher rank is cleared, so the chain never reports a
    /// later stage after an earlier one has failed (§4.B, testable property
    /// 4).
    pub fn apply_rank_mask(&mut self) {
        if let Some(first_false) = ConditionType::ALL
            .into_iter()
            .find(|t| matches!(self.get(*t), Some(c) if c.status == ConditionStatus::False))
        {
            for t in ConditionType::ALL {
                if t.rank() > first_false.rank() {
                    self.slots[t.rank()] = None;
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.slots.iter().filter_map(|c| c.as_ref())
    }
}

impl From<ConditionChain> for Vec<Condition> {
    fn from(chain: ConditionChain) -> Self {
        chain.slots.into_iter().flatten().collect()
    }
}

impl FromIterator<Condition> for ConditionChain {
    fn from_iter<I: IntoIterator<Item = Condition>>(iter: I) -> Self {
        let mut chain = Self::new();
        for c in iter {
            let rank = c.type_.rank();
            chain.slots[rank] = Some(c);
        }
        chain
    }
}

/// The fixed reason-string table used by [`rollup`] (§4.B, §6). Reason
/// strings are part of the external wire contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RollupReason {
    FullyScheduled,
    NotFullyScheduled,
    RolloutStartedReason,
    RolloutNotStartedYet,
    OverrideNotSpecified,
    OverriddenSucceeded,
    OverriddenFailed,
    WorkSynchronized,
    WorkNotSynchronizedYet,
    SyncWorkFailed,
    AllWorkApplied,
    WorkNotApplied,
    AllWorkAvailable,
    WorkNotAvailable,
    WorkNotTrackable,
    NotAvailableYet,
}

impl RollupReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            RollupReason::FullyScheduled => "FullyScheduled",
            RollupReason::NotFullyScheduled => "NotFullyScheduled",
            RollupReason::RolloutStartedReason => "RolloutStartedReason",
            RollupReason::RolloutNotStartedYet => "RolloutNotStartedYet",
            RollupReason::OverrideNotSpecified => "OverrideNotSpecified",
            RollupReason::OverriddenSucceeded => "OverriddenSucceeded",
            RollupReason::OverriddenFailed => "OverriddenFailed",
            RollupReason::WorkSynchronized => "WorkSynchronized",
            RollupReason::WorkNotSynchronizedYet => "WorkNotSynchronizedYet",
            RollupReason::SyncWorkFailed => "SyncWorkFailed",
            RollupReason::AllWorkApplied => "AllWorkApplied",
            RollupReason::WorkNotApplied => "WorkNotApplied",
            RollupReason::AllWorkAvailable => "AllWorkAvailable",
            RollupReason::WorkNotAvailable => "WorkNotAvailable",
            RollupReason::WorkNotTrackable => "WorkNotTrackable",
            RollupReason::NotAvailableYet => "NotAvailableYet",
        }
    }
}

/// Rolls up N children's condition at `rank` into one parent condition,
/// given the parent's `generation` (§4.B):
///
/// - `True` iff every child has `True` at `rank` with `observedGeneration >=
///   parent_generation`.
/// - `False` if any child is `False` at `rank`.
/// - `Unknown` otherwise.
///
/// `reason_true`/`reason_false`/`reason_unknown` select the wire reason for
/// each outcome from the [`RollupReason`] table (§6); callers pick the pair
/// appropriate to the rank being rolled up (e.g. Applied uses
/// `AllWorkApplied`/`WorkNotApplied`, Available uses
/// `AllWorkAvailable`/`WorkNotAvailable`/`WorkNotTrackable`).
pub fn rollup(
    children: &[Condition],
    rank: usize,
    parent_generation: i64,
    reason_true: RollupReason,
    reason_false: RollupReason,
    reason_unknown: RollupReason,
) -> Condition {
    let at_rank: Vec<&Condition> = children
        .iter()
        .filter(|c| c.type_.rank() == rank)
        .collect();

    let type_ = ConditionType::ALL[rank];

    if at_rank.iter().any(|c| c.status == ConditionStatus::False) {
        return Condition::new(type_, ConditionStatus::False, reason_false.as_str(), parent_generation);
    }

    let all_true_and_observed = !at_rank.is_empty()
        && at_rank.iter().all(|c| {
            c.status == ConditionStatus::True && c.observed_generation >= parent_generation
        });

    if all_true_and_observed {
        Condition::new(type_, ConditionStatus::True, reason_true.as_str(), parent_generation)
    } else {
        Condition::new(type_, ConditionStatus::Unknown, reason_unknown.as_str(), parent_generation)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn cond(type_: ConditionType, status: ConditionStatus, gen: i64) -> Condition {
        Condition::new(type_, status, "Reason", gen)
    }

    #[test]
    fn rank_order_matches_spec() {
        assert!(ConditionType::Scheduled.rank() < ConditionType::RolloutStarted.rank());
        assert!(ConditionType::RolloutStarted.rank() < ConditionType::Overridden.rank());
        assert!(ConditionType::Overridden.rank() < ConditionType::WorkSynchronized.rank());
        assert!(ConditionType::WorkSynchronized.rank() < ConditionType::Applied.rank());
        assert!(ConditionType::Applied.rank() < ConditionType::Available.rank());
    }

    #[test]
    fn rank_mask_clears_higher_ranks_after_false() {
        let now = OffsetDateTime::UNIX_EPOCH;
        let mut chain = ConditionChain::new();
        chain.set(cond(ConditionType::Scheduled, ConditionStatus::False, 1), now);
        chain.set(cond(ConditionType::RolloutStarted, ConditionStatus::True, 1), now);
        chain.apply_rank_mask();

        assert!(chain.get(ConditionType::Scheduled).is_some());
        assert!(chain.get(ConditionType::RolloutStarted).is_none());
    }

    #[test]
    fn monotonicity_preserves_transition_time_when_unchanged() {
        let t0 = OffsetDateTime::UNIX_EPOCH;
        let t1 = t0 + std::time::Duration::from_secs(60);

        let mut chain = ConditionChain::new();
        chain.set(cond(ConditionType::Scheduled, ConditionStatus::True, 1), t0);
        chain.set(cond(ConditionType::Scheduled, ConditionStatus::True, 2), t1);

        assert_eq!(chain.get(ConditionType::Scheduled).unwrap().last_transition_time, Some(t0));
    }

    #[test]
    fn monotonicity_bumps_transition_time_on_status_change() {
        let t0 = OffsetDateTime::UNIX_EPOCH;
        let t1 = t0 + std::time::Duration::from_secs(60);

        let mut chain = ConditionChain::new();
        chain.set(cond(ConditionType::Scheduled, ConditionStatus::True, 1), t0);
        chain.set(cond(ConditionType::Scheduled, ConditionStatus::False, 2), t1);

        assert_eq!(chain.get(ConditionType::Scheduled).unwrap().last_transition_time, Some(t1));
    }

    #[rstest]
    #[case(vec![
        cond(ConditionType::Applied, ConditionStatus::True, 3),
        cond(ConditionType::Applied, ConditionStatus::True, 3),
    ], 3, ConditionStatus::True)]
    #[case(vec![
        cond(ConditionType::Applied, ConditionStatus::True, 3),
        cond(ConditionType::Applied, ConditionStatus::False, 3),
    ], 3, ConditionStatus::False)]
    #[case(vec![
        cond(ConditionType::Applied, ConditionStatus::True, 2),
        cond(ConditionType::Applied, ConditionStatus::True, 3),
    ], 3, ConditionStatus::Unknown)]
    fn rollup_matches_spec_rules(
        #[case] children: Vec<Condition>,
        #[case] parent_generation: i64,
        #[case] expected: ConditionStatus,
    ) {
        let rolled = rollup(
            &children,
            ConditionType::Applied.rank(),
            parent_generation,
            RollupReason::AllWorkApplied,
            RollupReason::WorkNotApplied,
            RollupReason::WorkNotApplied,
        );
        assert_eq!(rolled.status, expected);
    }

    #[test]
    fn rollup_with_no_children_is_unknown() {
        let rolled = rollup(
            &[],
            ConditionType::Applied.rank(),
            1,
            RollupReason::AllWorkApplied,
            RollupReason::WorkNotApplied,
            RollupReason::WorkNotApplied,
        );
        assert_eq!(rolled.status, ConditionStatus::Unknown);
    }
}
