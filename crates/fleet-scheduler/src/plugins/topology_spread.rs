//! The topology-spread Score plugin (§4.C, §3 `PickN.topologySpread`):
//! prefers clusters in topology domains that are currently under-represented
//! among already-placed clusters, penalizing choices that would push the
//! max-skew past `maxSkew`.

use std::collections::BTreeMap;

use crate::plugin::{Cluster, HookResult, Plugin, SchedulingContext};

fn domain_counts<'a>(placed: &'a [Cluster], topology_key: &str) -> BTreeMap<&'a str, u32> {
    let mut counts = BTreeMap::new();
    for cluster in placed {
        if let Some(value) = cluster.labels.get(topology_key) {
            *counts.entry(value.as_str()).or_insert(0) += 1;
        }
    }
    counts
}

pub struct TopologySpreadPlugin;

impl Plugin for TopologySpreadPlugin {
    fn name(&self) -> &'static str {
        "TopologySpread"
    }

    fn score(&self, ctx: &SchedulingContext<'_>, cluster: &Cluster) -> HookResult<i32> {
        if ctx.topology_spread.is_empty() {
            return HookResult::Skip;
        }

        let mut total = 0i32;
        for constraint in ctx.topology_spread {
            let Some(domain) = cluster.labels.get(&constraint.topology_key) else {
                continue;
            };

            let counts = domain_counts(ctx.already_placed, &constraint.topology_key);
            let this_domain_count = counts.get(domain.as_str()).copied().unwrap_or(0);
            let max_count = counts.values().copied().max().unwrap_or(0);
            let min_count = counts.values().copied().min().unwrap_or(0);

            let resulting_skew = (this_domain_count + 1).max(max_count) - min_count;
            let penalty = resulting_skew.saturating_sub(constraint.max_skew) as i32;

            total += constraint.weight.saturating_sub(penalty);
        }

        HookResult::Success(total)
    }
}

#[cfg(test)]
mod tests {
    use fleet_core::model::TopologySpreadConstraint;

    use super::*;

    fn cluster(name: &str, zone: &str) -> Cluster {
        Cluster {
            name: name.into(),
            labels: BTreeMap::from([("zone".to_string(), zone.to_string())]),
            taints: vec![],
        }
    }

    #[test]
    fn prefers_underrepresented_domain() {
        let constraint = TopologySpreadConstraint {
            topology_key: "zone".into(),
            max_skew: 1,
            weight: 10,
        };
        let placed = vec![cluster("a", "zone-a"), cluster("b", "zone-a")];
        let ctx = SchedulingContext {
            already_placed: &placed,
            affinity: None,
            topology_spread: std::slice::from_ref(&constraint),
            tolerations: &[],
        };
        let plugin = TopologySpreadPlugin;

        let underrepresented = plugin.score(&ctx, &cluster("c", "zone-b"));
        let overrepresented = plugin.score(&ctx, &cluster("d", "zone-a"));

        let HookResult::Success(under_score) = underrepresented else {
            panic!("expected Success")
        };
        let HookResult::Success(over_score) = overrepresented else {
            panic!("expected Success")
        };
        assert!(under_score > over_score);
    }

    #[test]
    fn no_constraints_skips() {
        let ctx = SchedulingContext {
            already_placed: &[],
            affinity: None,
            topology_spread: &[],
            tolerations: &[],
        };
        let plugin = TopologySpreadPlugin;
        assert_eq!(plugin.score(&ctx, &cluster("a", "zone-a")), HookResult::Skip);
    }
}
