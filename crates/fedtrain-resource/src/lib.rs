//! TrainJob compiler for fedtrain training workloads
//!
//! Compiles validated `TrainingJobSpec` requests into TrainJob custom
//! resource documents plus a derived storage claim. Pure compilation crate —
//! no controller logic, no I/O.

mod compiler;
mod payload;
mod types;

pub use compiler::{convert, BuiltinAlgorithm};
pub use payload::{build_runtime_config, DataSourceConfig, RuntimeConfig};
pub use types::{
    ReplicaGroup, ResourceBlock, TrainJob, TrainJobMeta, TrainJobObservedStatus, TrainJobSpecDoc,
};
