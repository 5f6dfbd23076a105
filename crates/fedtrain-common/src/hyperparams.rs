//! Hyperparameter bags for training algorithms
//!
//! The gradient-boosting bag is strongly shaped: every field keeps its
//! declared type (ints stay ints, floats stay floats, string arrays stay
//! arrays) all the way into the runtime-configuration payload. The remote
//! training container parses that payload as typed JSON, so no field may
//! ever be coerced to a string. Non-builtin algorithms carry an open-ended
//! map instead.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Hyperparameters for one training job, keyed by algorithm family
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum HyperparameterBag {
    /// Typed bag for the builtin gradient-boosting algorithm
    GradientBoost(GradientBoostParams),
    /// Open-ended bag for non-builtin (container-image) algorithms.
    /// Values pass through as-is; callers own the schema.
    Custom(BTreeMap<String, serde_json::Value>),
}

impl HyperparameterBag {
    /// Serialize the bag into the JSON object embedded in the runtime
    /// configuration payload. Unset fields are omitted entirely.
    pub fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::GradientBoost(params) => serde_json::to_value(params),
            Self::Custom(map) => serde_json::to_value(map),
        }
    }
}

/// Gradient-boosting hyperparameters
///
/// Field names follow the trainer's own parameter vocabulary so the payload
/// maps onto the booster configuration without renaming. Every field is
/// optional; the trainer applies its own defaults for unset fields.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[allow(missing_docs)]
pub struct GradientBoostParams {
    // Booster selection and general setup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_round: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nthread: Option<i64>,

    // Tree construction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gamma: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_child_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_delta_step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsample: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colsample_bytree: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colsample_bylevel: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colsample_bynode: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lambda: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sketch_eps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_pos_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updater: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_leaf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grow_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_leaves: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bin: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_parallel_tree: Option<i64>,

    // DART booster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalize_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_drop: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_drop: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_drop: Option<f64>,

    // Linear booster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lambda_bias: Option<f64>,

    // Evaluation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub eval_metric: Vec<String>,
}
