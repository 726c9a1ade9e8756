//! [`ClusterWideKey`], the canonical identifier for any resource placed by
//! the core (§3).

use std::fmt::{self, Display};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Canonical identifier for any placed resource: `(group, version, kind,
/// namespace, name)`. Used as a deduplication and ordering key across
/// snapshots and Works (§3).
///
/// Implements a real total order (group, version, kind, namespace, name) so
/// it can be used directly as a `BTreeMap`/`BTreeSet` key, matching the "used
/// as a deduplication and ordering key" requirement literally.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct ClusterWideKey {
    pub group: String,
    pub version: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    pub name: String,
}

impl ClusterWideKey {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    fn sort_key(&self) -> (&str, &str, &str, &str, &str) {
        (
            &self.group,
            &self.version,
            &self.kind,
            &self.namespace,
            &self.name,
        )
    }
}

impl PartialOrd for ClusterWideKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ClusterWideKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl Display for ClusterWideKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let gv = if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        };

        if self.namespace.is_empty() {
            write!(f, "{gv}, kind={}, {}", self.kind, self.name)
        } else {
            write!(
                f,
                "{gv}, kind={}, {}/{}",
                self.kind, self.namespace, self.name
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_namespaced() {
        let key = ClusterWideKey::new("apps", "v1", "Deployment", "default", "web");
        assert_eq!(key.to_string(), "apps/v1, kind=Deployment, default/web");
    }

    #[test]
    fn display_cluster_scoped() {
        let key = ClusterWideKey::new("", "v1", "Namespace", "", "prod");
        assert_eq!(key.to_string(), "v1, kind=Namespace, prod");
    }

    #[test]
    fn ordering_is_total_and_deterministic() {
        let a = ClusterWideKey::new("apps", "v1", "Deployment", "default", "a");
        let b = ClusterWideKey::new("apps", "v1", "Deployment", "default", "b");
        let c = ClusterWideKey::new("apps", "v1", "Deployment", "kube-system", "a");

        assert!(a < b);
        assert!(b < c);

        let mut keys = vec![c.clone(), b.clone(), a.clone()];
        keys.sort();
        assert_eq!(keys, vec![a, b, c]);
    }
}
