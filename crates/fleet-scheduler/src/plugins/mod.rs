//! Built-in scheduling plugins (§4.C: "Affinity and topology-spread are
//! Score plugins using standard Kubernetes-style match expressions").

pub mod affinity;
pub mod pick_fixed;
pub mod tolerations;
pub mod topology_spread;

pub use affinity::AffinityPlugin;
pub use pick_fixed::PickFixedPlugin;
pub use tolerations::TolerationsPlugin;
pub use topology_spread::TopologySpreadPlugin;
