//! Training job request types
//!
//! `TrainingJobSpec` is the validated, immutable job request handed to the
//! engine by the surrounding system. Request validation glue (HTTP layer,
//! identity, tenant mapping) lives outside this crate; the shape checks that
//! the conversion depends on are here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::hyperparams::HyperparameterBag;

/// Algorithm selector: either a recognized builtin trainer or a
/// caller-supplied container image
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum AlgorithmSelector {
    /// A builtin trainer known to the engine (e.g., "xgboost")
    Builtin {
        /// Builtin trainer name
        name: String,
    },
    /// A caller-supplied training image
    Image {
        /// Fully qualified container image reference
        image: String,
        /// Entrypoint command; empty means the image default
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        command: Vec<String>,
    },
}

/// Resource request for one training job
///
/// Counts are whole units; quantities are copied verbatim into both
/// requests and limits of the derived resource document.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequest {
    /// CPU cores per replica
    pub cpu: u32,
    /// Memory in GiB per replica
    pub memory_gi: u32,
    /// GPU count per replica; zero means no GPU device plugin required
    #[serde(default)]
    pub gpu: u32,
    /// Number of worker instances
    pub instances: u32,
    /// Scratch volume size in GiB; zero means no volume
    #[serde(default)]
    pub volume_gi: u32,
}

/// One input data channel
///
/// Channels arrive with object-storage coordinates; inline uploads are
/// resolved into coordinates by the (out-of-scope) upload helper before the
/// spec reaches the engine. The first channel is the training split; a
/// second channel, if present, is the validation split.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataChannel {
    /// Channel name (e.g., "train", "validation")
    pub name: String,
    /// Object-storage bucket
    pub bucket: String,
    /// Object key within the bucket
    pub key: String,
    /// Object-storage endpoint; unset means the platform default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Access key credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    /// Secret key credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    /// Feature column selection; empty means all columns
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feature_columns: Vec<String>,
    /// Label column selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_column: Option<String>,
}

/// Where the trained model artifacts land
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum OutputLocation {
    /// A path on the training container's local volume
    LocalPath {
        /// Absolute path inside the container
        path: String,
    },
    /// Object-storage coordinates
    ObjectStore {
        /// Destination bucket
        bucket: String,
        /// Destination key prefix
        key: String,
    },
}

/// A validated training job request, immutable once accepted
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrainingJobSpec {
    /// Job name: a DNS label, unique within the namespace. Doubles as the
    /// external job ID — no surrogate key exists.
    pub name: String,
    /// Target namespace on the control plane
    pub namespace: String,
    /// Scheduling priority
    #[serde(default)]
    pub priority: i32,
    /// Algorithm selector
    pub algorithm: AlgorithmSelector,
    /// Resource request
    pub resources: ResourceRequest,
    /// Input data channels; the first is the training split
    pub channels: Vec<DataChannel>,
    /// Output location for trained artifacts
    pub output: OutputLocation,
    /// Optional checkpoint path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_path: Option<String>,
    /// Pre-existing storage claim name; set when the caller already owns a
    /// volume and no claim should be derived
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_claim: Option<String>,
    /// Run name surfaced to the trainer; defaults to the job name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_name: Option<String>,
    /// Hyperparameters, keyed by algorithm family
    pub hyperparameters: HyperparameterBag,
}

impl TrainingJobSpec {
    /// Run name for this job: explicit run name or the job name
    pub fn run_name(&self) -> &str {
        self.run_name.as_deref().unwrap_or(&self.name)
    }
}

/// Check that a name is a valid RFC 1123 DNS label
///
/// Lowercase alphanumerics and '-', starting and ending with an
/// alphanumeric, at most 63 characters.
pub fn is_dns_label(name: &str) -> bool {
    if name.is_empty() || name.len() > 63 {
        return false;
    }
    let bytes = name.as_bytes();
    let ok_edge = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    if !ok_edge(bytes[0]) || !ok_edge(bytes[bytes.len() - 1]) {
        return false;
    }
    bytes
        .iter()
        .all(|&b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Convenience constructor for the custom hyperparameter bag
pub fn custom_bag(entries: BTreeMap<String, serde_json::Value>) -> HyperparameterBag {
    HyperparameterBag::Custom(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dns_label_accepts_valid_names() {
        assert!(is_dns_label("iris-test"));
        assert!(is_dns_label("a"));
        assert!(is_dns_label("job-123"));
        assert!(is_dns_label("0leading-digit"));
    }

    #[test]
    fn dns_label_rejects_invalid_names() {
        assert!(!is_dns_label(""));
        assert!(!is_dns_label("-leading-dash"));
        assert!(!is_dns_label("trailing-dash-"));
        assert!(!is_dns_label("Upper-Case"));
        assert!(!is_dns_label("under_score"));
        assert!(!is_dns_label("dotted.name"));
        assert!(!is_dns_label(&"x".repeat(64)));
        assert!(is_dns_label(&"x".repeat(63)));
    }

    #[test]
    fn run_name_defaults_to_job_name() {
        let spec = TrainingJobSpec {
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
                instances: 1,
                volume_gi: 0,
            },
            channels: vec![],
            output: OutputLocation::LocalPath {
                path: "/out".to_string(),
            },
            checkpoint_path: None,
            volume_claim: None,
            run_name: None,
            hyperparameters: HyperparameterBag::Custom(BTreeMap::new()),
        };
        assert_eq!(spec.run_name(), "iris-test");

        let named = TrainingJobSpec {
            run_name: Some("experiment-7".to_string()),
            ..spec
        };
        assert_eq!(named.run_name(), "experiment-7");
    }
}
