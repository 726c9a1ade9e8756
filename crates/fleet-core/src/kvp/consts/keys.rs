use const_format::concatcp;

/// The key prefix used by every well-known Fleet label and annotation.
const FLEET_KEY_PREFIX: &str = "placement.fleet.io/";

/// Tracks the owning `ClusterResourcePlacement` on every object the core
/// produces: `PolicySnapshot`, `ResourceSnapshot`, `ResourceBinding` and
/// `Work` (§3, §6). Used as the label-index key for `ListByCRP`.
pub const CRP_TRACKING_LABEL: &str = concatcp!(FLEET_KEY_PREFIX, "parent-CRP");

/// Tracks the owning `ResourceBinding` on every `Work` object (§3 invariant 4).
pub const PARENT_BINDING_LABEL: &str = concatcp!(FLEET_KEY_PREFIX, "parent-resource-binding");

/// On a `ClusterSchedulingPolicySnapshot`, records the requested cluster count
/// for a `PickN` policy (§6).
pub const NUMBER_OF_CLUSTERS_ANNOTATION: &str = concatcp!(FLEET_KEY_PREFIX, "number-of-clusters");

/// On a sub-indexed `ClusterResourceSnapshot`, records its zero-based position
/// among the siblings of the same master (§3, §6). A value of `-1` is invalid.
pub const SUBINDEX_ANNOTATION: &str = concatcp!(FLEET_KEY_PREFIX, "subindex-of-resource-snapshot");

/// On a master `ClusterResourceSnapshot`, records the total number of
/// sub-snapshots that belong to it (§4.A).
pub const NUMBER_OF_RESOURCE_SNAPSHOTS_ANNOTATION: &str =
    concatcp!(FLEET_KEY_PREFIX, "number-of-resource-snapshots");

/// Marks a `ClusterSchedulingPolicySnapshot` or `ClusterResourceSnapshot` as
/// the latest one for its owning CRP (§3 invariant 1).
pub const IS_LATEST_SNAPSHOT_LABEL: &str = concatcp!(FLEET_KEY_PREFIX, "is-latest-snapshot");

/// The policy/resource snapshot index, monotonically increasing per CRP (§3).
pub const SNAPSHOT_INDEX_LABEL: &str = concatcp!(FLEET_KEY_PREFIX, "snapshot-index");

/// Name of the envelope resource wrapping a delivered manifest (GLOSSARY,
/// §4.E).
pub const ENVELOPE_NAME_LABEL: &str = concatcp!(FLEET_KEY_PREFIX, "envelope-name");

/// Namespace of the envelope resource wrapping a delivered manifest.
pub const ENVELOPE_NAMESPACE_LABEL: &str = concatcp!(FLEET_KEY_PREFIX, "envelope-namespace");

/// Type (GVK) of the envelope resource wrapping a delivered manifest.
pub const ENVELOPE_TYPE_LABEL: &str = concatcp!(FLEET_KEY_PREFIX, "envelope-type");

/// Finalizer blocking deletion of a `ClusterResourcePlacement` until every
/// binding and Work has been torn down (§6).
pub const CUSTOM_DELETION_BLOCKER_FINALIZER: &str =
    concatcp!(FLEET_KEY_PREFIX, "custom-deletion-blocker");
