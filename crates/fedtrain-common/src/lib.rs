//! Common types for fedtrain: job specs, status records, errors, and utilities

#![deny(missing_docs)]

pub mod error;
pub mod hyperparams;
pub mod job;
pub mod kube_utils;
pub mod status;
pub mod telemetry;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Field manager name used for all server-side-apply patches
pub const FIELD_MANAGER: &str = "fedtrain-engine";

/// API version of the TrainJob custom resource
pub const TRAINJOB_API_VERSION: &str = "training.fedtrain.dev/v1alpha1";

/// Kind of the TrainJob custom resource
pub const TRAINJOB_KIND: &str = "TrainJob";

/// Plural resource name for TrainJob
pub const TRAINJOB_PLURAL: &str = "trainjobs";

/// API version of the Karmada PropagationPolicy resource
pub const PROPAGATION_API_VERSION: &str = "policy.karmada.io/v1alpha1";

/// Kind of the Karmada PropagationPolicy resource
pub const PROPAGATION_KIND: &str = "PropagationPolicy";

/// Plural resource name for PropagationPolicy
pub const PROPAGATION_PLURAL: &str = "propagationpolicies";

/// API version of the Karmada member Cluster resource
pub const CLUSTER_API_VERSION: &str = "cluster.karmada.io/v1alpha1";

/// Kind of the Karmada member Cluster resource
pub const CLUSTER_KIND: &str = "Cluster";

/// Plural resource name for Cluster
pub const CLUSTER_PLURAL: &str = "clusters";

/// Default output path inside the training container when the output
/// location is not a local-path reference
pub const DEFAULT_STORAGE_PATH: &str = "/workspace/output";

/// Label key identifying resources managed by fedtrain
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Label value for resources managed by fedtrain
pub const LABEL_MANAGED_BY_FEDTRAIN: &str = "fedtrain";

/// Label key carrying the workload name
pub const LABEL_NAME: &str = "app.kubernetes.io/name";

/// Label key carrying the component role of a managed resource
pub const LABEL_COMPONENT: &str = "app.kubernetes.io/component";

/// Component label value for status-record ConfigMaps
pub const STATUS_COMPONENT: &str = "job-status";

/// Name prefix of the per-job status-record ConfigMap
pub const STATUS_CONFIGMAP_PREFIX: &str = "fedtrain-status-";

/// Label selector matching the status-record ConfigMaps
pub const STATUS_LABEL_SELECTOR: &str =
    "app.kubernetes.io/managed-by=fedtrain,app.kubernetes.io/component=job-status";
