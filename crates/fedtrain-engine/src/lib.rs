//! Federation training-job engine
//!
//! Ties the compilation, placement, and submission stages into one facade
//! and runs the background status reconciler. The engine owns no durable
//! state; the member clusters are the source of truth and the
//! [`store::JobStatusStore`] holds the synthesized view.

mod reconciler;
mod registry;
mod store;
mod submitter;

pub use reconciler::{
    decide, map_native_status, proxy_status_path, Observation, ReconcilerConfig, StatusReconciler,
};
pub use registry::ClusterRegistry;
pub use store::{ConfigMapStatusStore, InMemoryStatusStore, JobRef, JobStatusStore};
pub use submitter::{KubeSubmitter, ResourceSubmitter};

use std::sync::Arc;

use kube::Client;
use tracing::{info, warn};

use fedtrain_common::job::TrainingJobSpec;
use fedtrain_common::status::{JobPhase, JobStatusRecord};
use fedtrain_common::Result;

/// Receipt returned by a successful submission
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitReceipt {
    /// The job name, which doubles as the control-plane resource name
    pub job_id: String,
    /// The initial status record, always Pending
    pub status: JobStatusRecord,
}

/// Facade over the submit / delete / query lifecycle of training jobs
pub struct JobEngine {
    submitter: Arc<dyn ResourceSubmitter>,
    store: Arc<dyn JobStatusStore>,
}

impl JobEngine {
    pub fn new(client: Client, store: Arc<dyn JobStatusStore>) -> Self {
        Self::with_submitter(Arc::new(KubeSubmitter::new(client)), store)
    }

    /// Construct with an explicit submitter implementation
    pub fn with_submitter(
        submitter: Arc<dyn ResourceSubmitter>,
        store: Arc<dyn JobStatusStore>,
    ) -> Self {
        Self { submitter, store }
    }

    /// Compile a job request, derive its placement over `target_clusters`
    /// (empty means scheduler's choice among all ready clusters), and apply
    /// everything to the control plane.
    ///
    /// The whole pipeline validates and compiles before the first write, so
    /// an invalid request never leaves partial resources behind. A failure
    /// after compilation is recorded as a Failed status so the job is
    /// visible to queries rather than silently absent.
    pub async fn submit_job(
        &self,
        spec: &TrainingJobSpec,
        target_clusters: &[String],
    ) -> Result<SubmitReceipt> {
        let (resource, claim) = fedtrain_resource::convert(spec)?;
        let placement = fedtrain_placement::plan(&spec.name, &spec.namespace, target_clusters);

        match self
            .submitter
            .submit(&resource, claim.as_ref(), &placement)
            .await
        {
            Ok(()) => {
                let status = JobStatusRecord::pending();
                self.store.set(&spec.namespace, &spec.name, &status).await?;
                info!(job = %spec.name, namespace = %spec.namespace, "job accepted");
                Ok(SubmitReceipt {
                    job_id: spec.name.clone(),
                    status,
                })
            }
            Err(e) => {
                let failed = JobStatusRecord::failed_submission(e.to_string());
                if let Err(store_err) = self.store.set(&spec.namespace, &spec.name, &failed).await {
                    warn!(job = %spec.name, error = %store_err, "failed to record submission failure");
                }
                Err(e)
            }
        }
    }

    /// Delete a job's resources and mark it Stopped.
    ///
    /// Deletion is idempotent: resources already gone are tolerated, and a
    /// record already terminal keeps its phase.
    pub async fn delete_job(&self, name: &str, namespace: &str) -> Result<()> {
        self.submitter.delete(name, namespace).await?;

        if let Some(record) = self.store.get(namespace, name).await? {
            if !record.phase.is_terminal() {
                let mut stopped = record;
                stopped.advance(JobPhase::Stopped, "job deleted");
                self.store.set(namespace, name, &stopped).await?;
            }
        }
        Ok(())
    }

    /// Last reconciled status of a job, at most one tick interval stale
    pub async fn get_job_status(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<JobStatusRecord>> {
        self.store.get(namespace, name).await
    }
}
