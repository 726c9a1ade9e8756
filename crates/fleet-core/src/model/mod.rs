//! The declarative object surface on the hub (§3, §6): `Placement`,
//! snapshots, bindings, and Work, plus the shared [`ClusterWideKey`]
//! identifier used to deduplicate and order resources across all of them.

pub mod binding;
pub mod cluster_wide_key;
pub mod int_or_percent;
pub mod placement;
pub mod snapshot;
pub mod work;

pub use binding::{BindingState, Override, ResourceBinding};
pub use cluster_wide_key::ClusterWideKey;
pub use int_or_percent::{IntOrPercent, Rounding};
pub use placement::{
    ClusterAffinity, ClusterPlacementStatus, FailedResourcePlacement, MatchExpression,
    MatchOperator, Placement, PlacementPolicy, PlacementSpec, PlacementStatus, ResourceSelector,
    RolloutStrategy, Toleration, TopologySpreadConstraint, WeightedAffinityTerm,
};
pub use snapshot::{ClusterDecision, ClusterScore, PolicySnapshot, ResourceSnapshot};
pub use work::{EnvelopeRef, ManifestCondition, Work};
