//! TrainJob resource serialization types
//!
//! Typed representation of `training.fedtrain.dev/v1alpha1` TrainJob
//! resources. Uses serde for JSON serialization compatible with server-side
//! apply. The `status` subtree is written by the member-cluster training
//! operator and only read here, through the cluster aggregation proxy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// TrainJob resource (`training.fedtrain.dev/v1alpha1` Kind: TrainJob)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrainJob {
    pub api_version: String,
    pub kind: String,
    pub metadata: TrainJobMeta,
    pub spec: TrainJobSpecDoc,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TrainJobObservedStatus>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrainJobMeta {
    pub name: String,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// TrainJob spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrainJobSpecDoc {
    /// Entrypoint command; empty means the image default
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entrypoint: Vec<String>,

    /// Training container image
    pub image: String,

    /// Scheduling priority passed through to the member scheduler
    #[serde(default)]
    pub priority: i32,

    /// The single opaque runtime-configuration payload. A JSON document
    /// carrying every resolved hyperparameter, data-source credential, and
    /// storage path — the wire contract with every training image. Schema
    /// changes here are breaking and must be versioned explicitly.
    pub runtime_config: serde_json::Value,

    /// Head/worker replica topology
    pub groups: Vec<ReplicaGroup>,
}

/// One replica group of the training topology
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaGroup {
    /// Group name: "head" or "worker"
    pub name: String,
    pub replicas: u32,
    pub resources: ResourceBlock,
}

/// Resource quantities; requests and limits are copied verbatim from the
/// job request (no over-subscription)
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceBlock {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub requests: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub limits: BTreeMap<String, String>,
}

/// Status written by the member-cluster training operator
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrainJobObservedStatus {
    /// Native job state: SUCCEEDED, FAILED, RUNNING, PENDING, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Nested deployment-status detail (e.g., "Running", "Creating")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_state: Option<String>,

    /// Active replica count on this cluster, where reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<i32>,
}
