//! PropagationPolicy planner for fedtrain training jobs
//!
//! Compiles a target-cluster choice into a Karmada PropagationPolicy
//! document referencing the TrainJob by name. Pure compilation crate — no
//! controller logic.

mod planner;
mod types;

pub use planner::plan;
pub use types::{
    ClusterAffinity, Placement, PolicyMeta, PropagationPolicy, PropagationPolicySpec,
    ReplicaScheduling, ResourceSelector,
};
