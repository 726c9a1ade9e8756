//! The `PickFixed` Filter plugin (§4.C step 5: "the exact intersection with
//! the user list for PickFixed"): rejects any cluster not named in the
//! policy's `clusterNames`.

use crate::plugin::{Cluster, HookResult, Plugin, SchedulingContext};

pub struct PickFixedPlugin<'a> {
    pub cluster_names: &'a [String],
}

impl Plugin for PickFixedPlugin<'_> {
    fn name(&self) -> &'static str {
        "PickFixed"
    }

    fn filter(&self, _ctx: &SchedulingContext<'_>, cluster: &Cluster) -> HookResult {
        if self.cluster_names.iter().any(|name| name == &cluster.name) {
            HookResult::Success(())
        } else {
            HookResult::Unschedulable {
                reason: format!("cluster {:?} is not in the fixed cluster list", cluster.name),
            }
        }
    }
}
