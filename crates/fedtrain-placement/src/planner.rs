//! Placement planning
//!
//! One PropagationPolicy per job, named after it and deleted with it.

use std::collections::BTreeMap;

use fedtrain_common::{
    LABEL_MANAGED_BY, LABEL_MANAGED_BY_FEDTRAIN, PROPAGATION_API_VERSION, PROPAGATION_KIND,
    TRAINJOB_API_VERSION, TRAINJOB_KIND,
};

use crate::types::{
    ClusterAffinity, Placement, PolicyMeta, PropagationPolicy, PropagationPolicySpec,
    ReplicaScheduling, ResourceSelector,
};

/// Build the placement document for one training job.
///
/// A non-empty `target_clusters` becomes the affinity list exactly as given
/// — duplicates are the caller's responsibility and are deliberately not
/// deduplicated, so caller bugs surface instead of being masked. An empty
/// list leaves placement unconstrained, which downstream means "any ready
/// cluster": a default that favors availability over determinism.
pub fn plan(job_name: &str, namespace: &str, target_clusters: &[String]) -> PropagationPolicy {
    let cluster_affinity = if target_clusters.is_empty() {
        None
    } else {
        Some(ClusterAffinity {
            cluster_names: target_clusters.to_vec(),
        })
    };

    PropagationPolicy {
        api_version: PROPAGATION_API_VERSION.to_string(),
        kind: PROPAGATION_KIND.to_string(),
        metadata: PolicyMeta {
            name: job_name.to_string(),
            namespace: namespace.to_string(),
            labels: BTreeMap::from([(
                LABEL_MANAGED_BY.to_string(),
                LABEL_MANAGED_BY_FEDTRAIN.to_string(),
            )]),
        },
        spec: PropagationPolicySpec {
            resource_selectors: vec![ResourceSelector {
                api_version: TRAINJOB_API_VERSION.to_string(),
                kind: TRAINJOB_KIND.to_string(),
                name: job_name.to_string(),
            }],
            placement: Placement {
                cluster_affinity,
                replica_scheduling: ReplicaScheduling {
                    replica_scheduling_type: "Divided".to_string(),
                },
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_targets_become_the_affinity_list_exactly() {
        let targets = vec!["a".to_string(), "b".to_string()];
        let policy = plan("iris-test", "default", &targets);
        assert_eq!(policy.cluster_names(), Some(&targets[..]));
    }

    #[test]
    fn empty_targets_leave_placement_unconstrained() {
        let policy = plan("iris-test", "default", &[]);
        assert!(policy.cluster_names().is_none());
    }

    #[test]
    fn duplicates_are_not_deduplicated() {
        let targets = vec!["a".to_string(), "a".to_string()];
        let policy = plan("iris-test", "default", &targets);
        assert_eq!(policy.cluster_names().unwrap().len(), 2);
    }

    #[test]
    fn policy_is_named_after_the_job() {
        let policy = plan("iris-test", "ml-team", &[]);
        assert_eq!(policy.metadata.name, "iris-test");
        assert_eq!(policy.metadata.namespace, "ml-team");
        assert_eq!(policy.spec.resource_selectors.len(), 1);
        assert_eq!(policy.spec.resource_selectors[0].name, "iris-test");
        assert_eq!(policy.spec.resource_selectors[0].kind, "TrainJob");
    }

    #[test]
    fn scheduling_type_is_always_divided() {
        let policy = plan("iris-test", "default", &["a".to_string()]);
        assert_eq!(
            policy.spec.placement.replica_scheduling.replica_scheduling_type,
            "Divided"
        );
    }

    #[test]
    fn planning_is_deterministic() {
        let targets = vec!["b".to_string(), "a".to_string()];
        let one = plan("iris-test", "default", &targets);
        let two = plan("iris-test", "default", &targets);
        assert_eq!(one, two);
        // Order is preserved, not sorted
        assert_eq!(one.cluster_names().unwrap(), &["b", "a"]);
    }
}
