//! This module provides various types and functions to construct valid
//! Kubernetes labels. Labels are key/value pairs, where the key must meet
//! certain requirements regarding length and character set. The value can
//! contain a limited set of ASCII characters.
//!
//! Additionally, the [`well_known`] and [`sets`] modules provide helper
//! functions to construct the labels the core places on snapshots, bindings
//! and Work objects to track ownership (§3, §6).
//!
//! See <https://kubernetes.io/docs/concepts/overview/working-with-objects/labels/>
//! for more information on Kubernetes labels.

use crate::kvp::{KeyValuePair, KeyValuePairError, KeyValuePairs};

mod value;

pub use value::*;

/// A type alias for errors returned when construction or manipulation of a set
/// of labels fails.
pub type LabelError = KeyValuePairError<LabelValueError>;

/// A specialized implementation of a key/value pair representing Kubernetes
/// labels.
///
/// ```
/// # use fleet_core::kvp::Label;
/// let label = Label::try_from(("placement.fleet.io/parent-CRP", "demo-crp")).unwrap();
/// assert_eq!(label.to_string(), "placement.fleet.io/parent-CRP=demo-crp");
/// ```
///
/// The validation of the label value can fail due to multiple reasons. It can
/// only contain a limited set and combination of ASCII characters. See
/// <https://kubernetes.io/docs/concepts/overview/working-with-objects/labels/>
/// for more information on Kubernetes labels.
pub type Label = KeyValuePair<LabelValue>;

/// A validated set/list of Kubernetes labels.
///
/// It provides selected associated functions to manipulate the set of labels,
/// like inserting or extending.
///
/// ## Examples
///
/// ### Converting a BTreeMap into a list of labels
///
/// ```
/// # use std::collections::BTreeMap;
/// # use fleet_core::iter::TryFromIterator;
/// # use fleet_core::kvp::Labels;
/// let map = BTreeMap::from([
///     ("placement.fleet.io/snapshot-index", "0"),
///     ("placement.fleet.io/parent-CRP", "demo-crp"),
/// ]);
///
/// let labels = Labels::try_from_iter(map).unwrap();
/// ```
///
/// ### Creating a list of labels from an array
///
/// ```
/// # use fleet_core::iter::TryFromIterator;
/// # use fleet_core::kvp::Labels;
/// let labels = Labels::try_from_iter([
///     ("placement.fleet.io/snapshot-index", "0"),
///     ("placement.fleet.io/parent-CRP", "demo-crp"),
/// ]).unwrap();
/// ```
pub type Labels = KeyValuePairs<LabelValue>;

/// Well-known labels referenced by the external contract in §6.
pub mod well_known {
    use crate::kvp::consts::{CRP_TRACKING_LABEL, IS_LATEST_SNAPSHOT_LABEL, PARENT_BINDING_LABEL};

    use super::{Label, LabelError};

    /// Creates the `placement.fleet.io/parent-CRP` label tracking the owning
    /// `ClusterResourcePlacement` on a snapshot, binding, or Work (§3, §6).
    /// This is the label-index key used by `ListByCRP` (§4.A).
    pub fn crp_tracking(crp_name: &str) -> Result<Label, LabelError> {
        Label::try_from((CRP_TRACKING_LABEL, crp_name))
    }

    /// Creates the `placement.fleet.io/parent-resource-binding` label tracking
    /// the owning `ResourceBinding` on a `Work` object (§3 invariant 4).
    pub fn parent_binding(binding_name: &str) -> Result<Label, LabelError> {
        Label::try_from((PARENT_BINDING_LABEL, binding_name))
    }

    /// Creates the `placement.fleet.io/is-latest-snapshot` marker label used
    /// to select the single latest policy/resource snapshot master for a CRP
    /// (§3 invariant 1). The value is always the literal string `"true"`, so
    /// construction cannot fail.
    pub fn is_latest_snapshot() -> Label {
        Label::try_from((IS_LATEST_SNAPSHOT_LABEL, "true"))
            .expect("hard-coded is-latest-snapshot label is always valid")
    }
}

/// Common sets of labels placed on the objects the core produces.
pub mod sets {
    use crate::kvp::consts::SNAPSHOT_INDEX_LABEL;

    use super::{well_known, Label, LabelError, Labels};

    /// Labels placed on every `PolicySnapshot`/`ResourceSnapshot`: the
    /// CRP-tracking label plus the snapshot's own monotone index (§3, §6).
    pub fn snapshot_identity(crp_name: &str, index: u64) -> Result<Labels, LabelError> {
        let mut labels = Labels::from_iter([well_known::crp_tracking(crp_name)?]);
        labels.extend([Label::try_from((
            SNAPSHOT_INDEX_LABEL,
            index.to_string().as_str(),
        ))?]);
        Ok(labels)
    }

    /// Labels placed on every `ResourceBinding`: the CRP-tracking label.
    ///
    /// The target cluster is carried as a plain field on the binding, not a
    /// label -- per the GLOSSARY a back-reference is a label-selector lookup
    /// by owner, and a binding is only ever looked up by owning CRP, never by
    /// target cluster alone.
    pub fn binding_identity(crp_name: &str, _target_cluster: &str) -> Result<Labels, LabelError> {
        Ok(Labels::from_iter([well_known::crp_tracking(crp_name)?]))
    }

    /// Labels placed on every `Work`: the CRP-tracking label and the
    /// parent-binding label (§3 invariant 4).
    pub fn work_identity(crp_name: &str, binding_name: &str) -> Result<Labels, LabelError> {
        Ok(Labels::from_iter([
            well_known::crp_tracking(crp_name)?,
            well_known::parent_binding(binding_name)?,
        ]))
    }
}
