//! TrainJob compilation from training job specs
//!
//! `convert` is the pure half of the submission path: validated request in,
//! TrainJob document plus derived storage claim out. Deterministic —
//! identical input produces byte-identical output apart from the
//! caller-controlled job name.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use fedtrain_common::job::{is_dns_label, AlgorithmSelector, TrainingJobSpec};
use fedtrain_common::{
    Error, Result, LABEL_MANAGED_BY, LABEL_MANAGED_BY_FEDTRAIN, LABEL_NAME, TRAINJOB_API_VERSION,
    TRAINJOB_KIND,
};

use crate::payload::build_runtime_config;
use crate::types::{ReplicaGroup, ResourceBlock, TrainJob, TrainJobMeta, TrainJobSpecDoc};

/// GPU resource key; omitted entirely when the GPU count is zero so that
/// member clusters without a device plugin can still admit the pods
const GPU_RESOURCE_KEY: &str = "nvidia.com/gpu";

/// Builtin trainers the engine recognizes by name
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuiltinAlgorithm {
    /// Distributed gradient boosting (xgboost)
    XGBoost,
    /// Distributed gradient boosting (lightgbm)
    LightGBM,
}

impl BuiltinAlgorithm {
    /// Resolve a builtin name; None means the name is not recognized
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "xgboost" | "gradient-boost" => Some(Self::XGBoost),
            "lightgbm" => Some(Self::LightGBM),
            _ => None,
        }
    }

    /// Training image for this builtin
    pub fn image(&self) -> &'static str {
        match self {
            Self::XGBoost => "ghcr.io/fedtrain/xgboost-trainer:v1",
            Self::LightGBM => "ghcr.io/fedtrain/lightgbm-trainer:v1",
        }
    }

    /// Entrypoint command for this builtin
    pub fn entrypoint(&self) -> Vec<String> {
        let module = match self {
            Self::XGBoost => "trainer.xgboost",
            Self::LightGBM => "trainer.lightgbm",
        };
        vec!["python".to_string(), "-m".to_string(), module.to_string()]
    }
}

/// Convert a validated job request into a TrainJob document and, where the
/// request asks for scratch storage, a derived PersistentVolumeClaim.
///
/// Fails with a validation error if the algorithm is neither a recognized
/// builtin nor carries an image, if the job name is not a DNS label, or if
/// resource counts are non-positive. No I/O happens here.
pub fn convert(spec: &TrainingJobSpec) -> Result<(TrainJob, Option<PersistentVolumeClaim>)> {
    validate(spec)?;

    let (image, entrypoint) = resolve_algorithm(spec)?;
    let runtime_config = build_runtime_config(spec)?;
    let runtime_config = serde_json::to_value(&runtime_config)
        .map_err(|e| Error::conversion_for(&spec.name, format!("runtime config: {e}")))?;

    let resources = resource_block(spec);
    let worker_replicas = spec.resources.instances.max(1);

    let job = TrainJob {
        api_version: TRAINJOB_API_VERSION.to_string(),
        kind: TRAINJOB_KIND.to_string(),
        metadata: TrainJobMeta {
            name: spec.name.clone(),
            namespace: spec.namespace.clone(),
            labels: managed_labels(&spec.name),
            annotations: BTreeMap::new(),
        },
        spec: TrainJobSpecDoc {
            entrypoint,
            image,
            priority: spec.priority,
            runtime_config,
            groups: vec![
                ReplicaGroup {
                    name: "head".to_string(),
                    replicas: 1,
                    resources: resources.clone(),
                },
                ReplicaGroup {
                    name: "worker".to_string(),
                    replicas: worker_replicas,
                    resources,
                },
            ],
        },
        status: None,
    };

    let claim = storage_claim(spec);

    Ok((job, claim))
}

fn validate(spec: &TrainingJobSpec) -> Result<()> {
    if !is_dns_label(&spec.name) {
        return Err(Error::validation_for_field(
            &spec.name,
            "name",
            "job name must be a lowercase DNS label of at most 63 characters",
        ));
    }
    if spec.resources.cpu == 0 {
        return Err(Error::validation_for_field(
            &spec.name,
            "resources.cpu",
            "cpu cores must be positive",
        ));
    }
    if spec.resources.memory_gi == 0 {
        return Err(Error::validation_for_field(
            &spec.name,
            "resources.memoryGi",
            "memory must be positive",
        ));
    }
    if spec.resources.instances == 0 {
        return Err(Error::validation_for_field(
            &spec.name,
            "resources.instances",
            "instance count must be positive",
        ));
    }
    if spec.channels.is_empty() {
        return Err(Error::validation_for_field(
            &spec.name,
            "channels",
            "at least one data channel is required",
        ));
    }
    Ok(())
}

fn resolve_algorithm(spec: &TrainingJobSpec) -> Result<(String, Vec<String>)> {
    match &spec.algorithm {
        AlgorithmSelector::Builtin { name } => match BuiltinAlgorithm::from_name(name) {
            Some(builtin) => Ok((builtin.image().to_string(), builtin.entrypoint())),
            None => Err(Error::validation_for_field(
                &spec.name,
                "algorithm.name",
                format!("'{name}' is not a recognized builtin algorithm"),
            )),
        },
        AlgorithmSelector::Image { image, command } => {
            if image.is_empty() {
                return Err(Error::validation_for_field(
                    &spec.name,
                    "algorithm.image",
                    "container image must not be empty",
                ));
            }
            Ok((image.clone(), command.clone()))
        }
    }
}

/// Quantities copied verbatim into both requests and limits. The GPU key is
/// absent, not "0", when no GPUs are requested.
fn resource_block(spec: &TrainingJobSpec) -> ResourceBlock {
    let mut quantities = BTreeMap::new();
    quantities.insert("cpu".to_string(), spec.resources.cpu.to_string());
    quantities.insert(
        "memory".to_string(),
        format!("{}Gi", spec.resources.memory_gi),
    );
    if spec.resources.gpu > 0 {
        quantities.insert(GPU_RESOURCE_KEY.to_string(), spec.resources.gpu.to_string());
    }
    ResourceBlock {
        requests: quantities.clone(),
        limits: quantities,
    }
}

/// Derived storage claim: emitted only when the request asks for a positive
/// volume size and the caller has not supplied a pre-existing claim
fn storage_claim(spec: &TrainingJobSpec) -> Option<PersistentVolumeClaim> {
    if spec.resources.volume_gi == 0 || spec.volume_claim.is_some() {
        return None;
    }

    let mut requests = BTreeMap::new();
    requests.insert(
        "storage".to_string(),
        Quantity(format!("{}Gi", spec.resources.volume_gi)),
    );

    Some(PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(claim_name(&spec.name)),
            namespace: Some(spec.namespace.clone()),
            labels: Some(managed_labels(&spec.name)),
            ..Default::default()
        },
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            resources: Some(VolumeResourceRequirements {
                requests: Some(requests),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    })
}

/// Name of the derived storage claim for a job
pub(crate) fn claim_name(job_name: &str) -> String {
    format!("{job_name}-storage")
}

fn managed_labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (LABEL_NAME.to_string(), name.to_string()),
        (
            LABEL_MANAGED_BY.to_string(),
            LABEL_MANAGED_BY_FEDTRAIN.to_string(),
        ),
    ])
}
