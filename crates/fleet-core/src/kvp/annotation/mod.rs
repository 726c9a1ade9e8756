//! This module provides various types and functions to construct valid Kubernetes
//! annotations. Annotations are key/value pairs, where the key must meet certain
//! requirements regarding length and character set. The value can contain
//! **any** valid UTF-8 data.
//!
//! See <https://kubernetes.io/docs/concepts/overview/working-with-objects/annotations/>
//! for more information on Kubernetes annotations.
use std::convert::Infallible;

use crate::kvp::{KeyValuePair, KeyValuePairError, KeyValuePairs};

mod value;

pub use value::*;

/// A type alias for errors returned when construction or manipulation of a set
/// of annotations fails.
pub type AnnotationError = KeyValuePairError<Infallible>;

/// A specialized implementation of a key/value pair representing Kubernetes
/// annotations.
///
/// The validation of the annotation value can **never** fail, as [`str`] is
/// guaranteed to only contain valid UTF-8 data - which is the only
/// requirement for a valid Kubernetes annotation value.
///
/// See <https://kubernetes.io/docs/concepts/overview/working-with-objects/annotations/>
/// for more information on Kubernetes annotations.
pub type Annotation = KeyValuePair<AnnotationValue>;

/// A validated set/list of Kubernetes annotations.
///
/// It provides selected associated functions to manipulate the set of
/// annotations, like inserting or extending.
///
/// ## Examples
///
/// ### Converting a BTreeMap into a list of annotations
///
/// ```
/// # use std::collections::BTreeMap;
/// # use fleet_core::iter::TryFromIterator;
/// # use fleet_core::kvp::Annotations;
/// let map = BTreeMap::from([
///     ("placement.fleet.io/number-of-clusters", "3"),
///     ("placement.fleet.io/subindex-of-resource-snapshot", "0"),
/// ]);
///
/// let annotations = Annotations::try_from_iter(map).unwrap();
/// ```
///
/// ### Creating a list of annotations from an array
///
/// ```
/// # use fleet_core::iter::TryFromIterator;
/// # use fleet_core::kvp::Annotations;
/// let annotations = Annotations::try_from_iter([
///     ("placement.fleet.io/number-of-clusters", "3"),
///     ("placement.fleet.io/subindex-of-resource-snapshot", "0"),
/// ]).unwrap();
/// ```
pub type Annotations = KeyValuePairs<AnnotationValue>;

/// Well-known annotations referenced by the external contract in §6.
pub mod well_known {
    use crate::kvp::{
        consts::{
            NUMBER_OF_CLUSTERS_ANNOTATION, NUMBER_OF_RESOURCE_SNAPSHOTS_ANNOTATION,
            SUBINDEX_ANNOTATION,
        },
        Annotation, AnnotationError,
    };

    /// Constructs a `placement.fleet.io/number-of-clusters` annotation,
    /// recording the requested cluster count for a `PickN` policy (§6).
    pub fn number_of_clusters(count: u32) -> Result<Annotation, AnnotationError> {
        Annotation::try_from((NUMBER_OF_CLUSTERS_ANNOTATION, count.to_string().as_str()))
    }

    /// Constructs a `placement.fleet.io/subindex-of-resource-snapshot`
    /// annotation, recording a sub-snapshot's zero-based position among the
    /// siblings of its master (§3, §6).
    pub fn subindex(index: u32) -> Result<Annotation, AnnotationError> {
        Annotation::try_from((SUBINDEX_ANNOTATION, index.to_string().as_str()))
    }

    /// Constructs a `placement.fleet.io/number-of-resource-snapshots`
    /// annotation, recording the total number of sub-snapshots belonging to a
    /// master `ResourceSnapshot` (§4.A).
    pub fn number_of_resource_snapshots(count: u32) -> Result<Annotation, AnnotationError> {
        Annotation::try_from((
            NUMBER_OF_RESOURCE_SNAPSHOTS_ANNOTATION,
            count.to_string().as_str(),
        ))
    }
}
