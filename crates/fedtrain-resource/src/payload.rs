//! Runtime-configuration payload
//!
//! The payload is one JSON document embedded under the fixed `runtimeConfig`
//! key of the TrainJob spec, replacing an earlier per-field
//! environment-variable scheme. The training container parses it as typed
//! JSON at startup, so every hyperparameter keeps its declared type —
//! coercing a number to a string here breaks every training image.

use serde::{Deserialize, Serialize};

use fedtrain_common::job::{OutputLocation, TrainingJobSpec};
use fedtrain_common::{Error, Result, DEFAULT_STORAGE_PATH};

/// The runtime-configuration payload, as consumed by training containers
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    /// Worker replica count
    pub worker_num: u32,

    /// Whether GPU devices are requested
    pub use_gpu: bool,

    /// Label column from the training channel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_column: Option<String>,

    /// Run name surfaced in trainer logs and artifact naming
    pub run_name: String,

    /// Local output path inside the container
    pub storage_path: String,

    /// Optional checkpoint path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_path: Option<String>,

    /// Object-storage credential block from the training channel
    pub data_source: DataSourceConfig,

    /// Per-algorithm hyperparameters, copied field-for-field with their
    /// declared JSON types
    pub hyperparameters: serde_json::Value,
}

/// Object-storage coordinates and credentials for the input data
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub bucket: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    /// Validation-split object key, from the second channel if present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_key: Option<String>,
}

/// Build the runtime-configuration payload from a validated job spec.
///
/// The credential block comes from the first input channel; a second
/// channel, if present, is the validation split and contributes only its
/// path. The storage path is the output location's local path verbatim, or
/// the fixed default for object-store outputs.
pub fn build_runtime_config(spec: &TrainingJobSpec) -> Result<RuntimeConfig> {
    let train = spec
        .channels
        .first()
        .ok_or_else(|| Error::validation_for(&spec.name, "at least one data channel is required"))?;

    let data_source = DataSourceConfig {
        endpoint: train.endpoint.clone(),
        bucket: train.bucket.clone(),
        key: train.key.clone(),
        access_key: train.access_key.clone(),
        secret_key: train.secret_key.clone(),
        validation_key: spec.channels.get(1).map(|c| c.key.clone()),
    };

    let storage_path = match &spec.output {
        OutputLocation::LocalPath { path } => path.clone(),
        OutputLocation::ObjectStore { .. } => DEFAULT_STORAGE_PATH.to_string(),
    };

    let hyperparameters = spec
        .hyperparameters
        .to_payload()
        .map_err(|e| Error::conversion_for(&spec.name, format!("hyperparameter bag: {e}")))?;
    if !hyperparameters.is_object() {
        return Err(Error::conversion_for(
            &spec.name,
            "hyperparameter bag did not serialize to a JSON object",
        ));
    }

    Ok(RuntimeConfig {
        worker_num: spec.resources.instances.max(1),
        use_gpu: spec.resources.gpu > 0,
        label_column: train.label_column.clone(),
        run_name: spec.run_name().to_string(),
        storage_path,
        checkpoint_path: spec.checkpoint_path.clone(),
        data_source,
        hyperparameters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedtrain_common::hyperparams::{GradientBoostParams, HyperparameterBag};
    use fedtrain_common::job::{AlgorithmSelector, DataChannel, ResourceRequest};

    fn channel(name: &str, bucket: &str, key: &str) -> DataChannel {
        DataChannel {
            name: name.to_string(),
            bucket: bucket.to_string(),
            key: key.to_string(),
            endpoint: Some("http://minio.storage:9000".to_string()),
            access_key: Some("ak".to_string()),
            secret_key: Some("sk".to_string()),
            feature_columns: vec![],
            label_column: Some("species".to_string()),
        }
    }

    fn base_spec() -> TrainingJobSpec {
        TrainingJobSpec {
            name: "iris-test".to_string(),
            namespace: "default".to_string(),
            priority: 0,
            algorithm: AlgorithmSelector::Builtin {
                name: "xgboost".to_string(),
            },
            resources: ResourceRequest {
                cpu: 2,
                memory_gi: 4,
                gpu: 0,
                instances: 2,
                volume_gi: 10,
            },
            channels: vec![channel("train", "datasets", "iris/train.csv")],
            output: OutputLocation::ObjectStore {
                bucket: "models".to_string(),
                key: "iris/".to_string(),
            },
            checkpoint_path: None,
            volume_claim: None,
            run_name: None,
            hyperparameters: HyperparameterBag::GradientBoost(GradientBoostParams {
                eta: Some(0.3),
                max_depth: Some(6),
                eval_metric: vec!["rmse".to_string(), "mae".to_string()],
                ..Default::default()
            }),
        }
    }

    #[test]
    fn credentials_come_from_the_first_channel() {
        let config = build_runtime_config(&base_spec()).unwrap();
        assert_eq!(config.data_source.bucket, "datasets");
        assert_eq!(config.data_source.key, "iris/train.csv");
        assert_eq!(config.data_source.access_key.as_deref(), Some("ak"));
        assert!(config.data_source.validation_key.is_none());
    }

    #[test]
    fn second_channel_contributes_only_its_path() {
        let mut spec = base_spec();
        let mut val = channel("validation", "other-bucket", "iris/val.csv");
        val.access_key = Some("other-ak".to_string());
        spec.channels.push(val);

        let config = build_runtime_config(&spec).unwrap();
        // Credentials stay with the training channel
        assert_eq!(config.data_source.access_key.as_deref(), Some("ak"));
        assert_eq!(config.data_source.bucket, "datasets");
        assert_eq!(
            config.data_source.validation_key.as_deref(),
            Some("iris/val.csv")
        );
    }

    #[test]
    fn storage_path_extracted_verbatim_from_local_output() {
        let mut spec = base_spec();
        spec.output = OutputLocation::LocalPath {
            path: "/mnt/results/run-7".to_string(),
        };
        let config = build_runtime_config(&spec).unwrap();
        assert_eq!(config.storage_path, "/mnt/results/run-7");
    }

    #[test]
    fn object_store_output_uses_default_storage_path() {
        let config = build_runtime_config(&base_spec()).unwrap();
        assert_eq!(config.storage_path, DEFAULT_STORAGE_PATH);
    }

    #[test]
    fn gpu_flag_derived_from_gpu_count() {
        let config = build_runtime_config(&base_spec()).unwrap();
        assert!(!config.use_gpu);

        let mut spec = base_spec();
        spec.resources.gpu = 4;
        let config = build_runtime_config(&spec).unwrap();
        assert!(config.use_gpu);
    }

    #[test]
    fn hyperparameters_keep_their_declared_types() {
        let config = build_runtime_config(&base_spec()).unwrap();
        let json = serde_json::to_value(&config).unwrap();

        // Number, not "0.3"
        assert_eq!(json["hyperparameters"]["eta"], serde_json::json!(0.3));
        assert!(json["hyperparameters"]["eta"].is_f64());
        assert_eq!(json["hyperparameters"]["max_depth"], serde_json::json!(6));
        assert!(json["hyperparameters"]["max_depth"].is_i64());
        assert_eq!(
            json["hyperparameters"]["eval_metric"],
            serde_json::json!(["rmse", "mae"])
        );
    }

    #[test]
    fn empty_channels_is_a_validation_error() {
        let mut spec = base_spec();
        spec.channels.clear();
        let err = build_runtime_config(&spec).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn payload_round_trip() {
        let config = build_runtime_config(&base_spec()).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let de: RuntimeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, de);
    }
}
