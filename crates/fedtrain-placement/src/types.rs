//! PropagationPolicy serialization types
//!
//! Typed representation of Karmada `policy.karmada.io/v1alpha1`
//! PropagationPolicy resources, restricted to the fields this engine emits.
//! Uses serde for JSON serialization compatible with server-side apply.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// PropagationPolicy resource (`policy.karmada.io/v1alpha1`)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropagationPolicy {
    pub api_version: String,
    pub kind: String,
    pub metadata: PolicyMeta,
    pub spec: PropagationPolicySpec,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyMeta {
    pub name: String,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// PropagationPolicy spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropagationPolicySpec {
    pub resource_selectors: Vec<ResourceSelector>,
    pub placement: Placement,
}

/// Selects the resource(s) the policy propagates
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSelector {
    pub api_version: String,
    pub kind: String,
    pub name: String,
}

/// Where and how replicas are scheduled
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    /// Target member clusters. None means unconstrained: any ready cluster
    /// may be matched downstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_affinity: Option<ClusterAffinity>,

    pub replica_scheduling: ReplicaScheduling,
}

/// Explicit cluster name affinity
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAffinity {
    pub cluster_names: Vec<String>,
}

/// Replica scheduling strategy
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaScheduling {
    /// Always "Divided": replica count split across all matched clusters.
    /// No other strategy is supported by this engine.
    pub replica_scheduling_type: String,
}

impl PropagationPolicy {
    /// Cluster names this policy constrains placement to, if any
    pub fn cluster_names(&self) -> Option<&[String]> {
        self.spec
            .placement
            .cluster_affinity
            .as_ref()
            .map(|a| a.cluster_names.as_slice())
    }
}
