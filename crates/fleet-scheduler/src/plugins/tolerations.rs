//! The tolerations Filter plugin (§4.C Filter plugins, §3 `PickN.tolerations`):
//! a cluster carrying a taint is schedulable only if the policy declares a
//! matching toleration.

use fleet_core::model::Toleration;

use crate::plugin::{Cluster, HookResult, Plugin, SchedulingContext};

/// Parses a taint string of the form `key` or `key=value`.
fn parse_taint(taint: &str) -> (&str, Option<&str>) {
    match taint.split_once('=') {
        Some((key, value)) => (key, Some(value)),
        None => (taint, None),
    }
}

fn is_tolerated(taint: &str, tolerations: &[Toleration]) -> bool {
    let (key, value) = parse_taint(taint);
    tolerations.iter().any(|t| {
        t.key == key && t.value.as_deref().is_none_or(|tv| Some(tv) == value)
    })
}

pub struct TolerationsPlugin;

impl Plugin for TolerationsPlugin {
    fn name(&self) -> &'static str {
        "Tolerations"
    }

    fn filter(&self, ctx: &SchedulingContext<'_>, cluster: &Cluster) -> HookResult {
        let untolerated: Vec<&str> = cluster
            .taints
            .iter()
            .map(String::as_str)
            .filter(|taint| !is_tolerated(taint, ctx.tolerations))
            .collect();

        if untolerated.is_empty() {
            HookResult::Success(())
        } else {
            HookResult::Unschedulable {
                reason: format!("cluster {:?} has untolerated taints {untolerated:?}", cluster.name),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(taints: &[&str]) -> Cluster {
        Cluster {
            name: "c".into(),
            labels: Default::default(),
            taints: taints.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn untainted_cluster_is_always_schedulable() {
        let ctx = SchedulingContext {
            already_placed: &[],
            affinity: None,
            topology_spread: &[],
            tolerations: &[],
        };
        assert_eq!(
            TolerationsPlugin.filter(&ctx, &cluster(&[])),
            HookResult::Success(())
        );
    }

    #[test]
    fn matching_toleration_admits_keyed_taint() {
        let tolerations = vec![Toleration {
            key: "dedicated".into(),
            value: Some("gpu".into()),
        }];
        let ctx = SchedulingContext {
            already_placed: &[],
            affinity: None,
            topology_spread: &[],
            tolerations: &tolerations,
        };
        assert_eq!(
            TolerationsPlugin.filter(&ctx, &cluster(&["dedicated=gpu"])),
            HookResult::Success(())
        );
    }

    #[test]
    fn missing_toleration_is_unschedulable() {
        let ctx = SchedulingContext {
            already_placed: &[],
            affinity: None,
            topology_spread: &[],
            tolerations: &[],
        };
        assert!(TolerationsPlugin.filter(&ctx, &cluster(&["dedicated=gpu"])).is_unschedulable());
    }

    #[test]
    fn value_less_toleration_tolerates_any_value() {
        let tolerations = vec![Toleration {
            key: "dedicated".into(),
            value: None,
        }];
        let ctx = SchedulingContext {
            already_placed: &[],
            affinity: None,
            topology_spread: &[],
            tolerations: &tolerations,
        };
        assert_eq!(
            TolerationsPlugin.filter(&ctx, &cluster(&["dedicated=gpu"])),
            HookResult::Success(())
        );
    }
}
