//! The Rollout Controller (§4.D), Work Generator (§4.E), and Placement
//! Aggregator (§4.F): together they turn scheduling decisions and resource
//! snapshots into per-cluster Work and roll per-manifest status back up into
//! CRP conditions.

pub mod aggregator;
pub mod error;
pub mod overrides;
pub mod rollout;
pub mod work_generator;

pub use error::ControllerError;
