//! The `ClusterAffinity` plugin (§4.C): required match expressions act as a
//! Filter, preferred weighted terms contribute to Score. Operator handling
//! mirrors the standard Kubernetes `In`/`NotIn`/`Exists`/`DoesNotExist` match
//! expression semantics.

use std::collections::BTreeMap;

use fleet_core::model::{MatchExpression, MatchOperator};

use crate::plugin::{Cluster, HookResult, Plugin, SchedulingContext};

/// Evaluates one match expression against a cluster's labels.
fn matches(expr: &MatchExpression, labels: &BTreeMap<String, String>) -> bool {
    match expr.operator {
        MatchOperator::Exists => labels.contains_key(&expr.key),
        MatchOperator::DoesNotExist => !labels.contains_key(&expr.key),
        MatchOperator::In => labels
            .get(&expr.key)
            .is_some_and(|v| expr.values.iter().any(|candidate| candidate == v)),
        MatchOperator::NotIn => labels
            .get(&expr.key)
            .is_none_or(|v| expr.values.iter().all(|candidate| candidate != v)),
    }
}

fn matches_all(exprs: &[MatchExpression], labels: &BTreeMap<String, String>) -> bool {
    exprs.iter().all(|expr| matches(expr, labels))
}

pub struct AffinityPlugin;

impl Plugin for AffinityPlugin {
    fn name(&self) -> &'static str {
        "ClusterAffinity"
    }

    fn filter(&self, ctx: &SchedulingContext<'_>, cluster: &Cluster) -> HookResult {
        let Some(affinity) = ctx.affinity else {
            return HookResult::Skip;
        };
        if affinity.required.is_empty() {
            return HookResult::Skip;
        }
        if matches_all(&affinity.required, &cluster.labels) {
            HookResult::Success(())
        } else {
            HookResult::Unschedulable {
                reason: format!("cluster {:?} does not satisfy required affinity", cluster.name),
            }
        }
    }

    fn score(&self, ctx: &SchedulingContext<'_>, cluster: &Cluster) -> HookResult<i32> {
        let Some(affinity) = ctx.affinity else {
            return HookResult::Skip;
        };
        if affinity.preferred.is_empty() {
            return HookResult::Skip;
        }

        let total: i32 = affinity
            .preferred
            .iter()
            .filter(|term| matches_all(&term.match_expressions, &cluster.labels))
            .map(|term| term.weight)
            .sum();

        HookResult::Success(total)
    }
}
