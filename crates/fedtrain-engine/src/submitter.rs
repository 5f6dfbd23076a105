//! Resource submission to the federation control plane
//!
//! Applies the derived storage claim, the TrainJob, and its
//! PropagationPolicy in that order. Server-side apply makes every write
//! idempotent; deletion is the mirror operation and tolerates resources
//! that are already gone, so it is safe to retry and safe to call on
//! partially-submitted jobs.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::PersistentVolumeClaim;
use kube::api::{Api, Patch, PatchParams};
use kube::Client;
use tracing::{info, warn};

use fedtrain_common::kube_utils::{
    apply_dynamic, delete_dynamic, propagation_api_resource, trainjob_api_resource,
};
use fedtrain_common::{Error, Result, FIELD_MANAGER};
use fedtrain_placement::PropagationPolicy;
use fedtrain_resource::TrainJob;

/// Applies and deletes the control-plane resources of one job. The engine
/// facade depends on this seam; `KubeSubmitter` is the production
/// implementation.
#[async_trait]
pub trait ResourceSubmitter: Send + Sync {
    /// Apply claim, resource, and placement for one job
    async fn submit(
        &self,
        resource: &TrainJob,
        claim: Option<&PersistentVolumeClaim>,
        placement: &PropagationPolicy,
    ) -> Result<()>;

    /// Delete the placement and resource of one job; idempotent
    async fn delete(&self, name: &str, namespace: &str) -> Result<()>;
}

/// Submitter backed by the federation control-plane API
pub struct KubeSubmitter {
    client: Client,
}

impl KubeSubmitter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceSubmitter for KubeSubmitter {
    async fn submit(
        &self,
        resource: &TrainJob,
        claim: Option<&PersistentVolumeClaim>,
        placement: &PropagationPolicy,
    ) -> Result<()> {
        submit(&self.client, resource, claim, placement).await
    }

    async fn delete(&self, name: &str, namespace: &str) -> Result<()> {
        delete(&self.client, name, namespace).await
    }
}

/// Apply claim, resource, and placement for one job.
///
/// The claim is applied first; a claim failure is logged and swallowed
/// because the claim may legitimately exist from a prior attempt. A TrainJob
/// failure aborts before any placement is written, so no placement ever
/// references a non-existent resource. A placement failure after a
/// successful resource write surfaces as a submission error; the caller is
/// expected to delete and retry.
async fn submit(
    client: &Client,
    resource: &TrainJob,
    claim: Option<&PersistentVolumeClaim>,
    placement: &PropagationPolicy,
) -> Result<()> {
    let name = &resource.metadata.name;
    let namespace = &resource.metadata.namespace;

    if let Some(claim) = claim {
        if let Err(e) = apply_claim(client, namespace, claim).await {
            warn!(job = %name, error = %e, "storage claim creation failed, continuing");
        }
    }

    apply_dynamic(client, namespace, &trainjob_api_resource(), name, resource)
        .await
        .map_err(|e| Error::submission_for(name, e.to_string()))?;

    apply_dynamic(
        client,
        namespace,
        &propagation_api_resource(),
        &placement.metadata.name,
        placement,
    )
    .await
    .map_err(|e| Error::submission_for(name, format!("placement: {e}")))?;

    info!(job = %name, namespace = %namespace, "submitted training job");
    Ok(())
}

async fn apply_claim(
    client: &Client,
    namespace: &str,
    claim: &PersistentVolumeClaim,
) -> Result<()> {
    let name = claim
        .metadata
        .name
        .as_deref()
        .ok_or_else(|| Error::internal_with_context("submitter", "claim has no name"))?;
    let api: Api<PersistentVolumeClaim> = Api::namespaced(client.clone(), namespace);
    api.patch(
        name,
        &PatchParams::apply(FIELD_MANAGER).force(),
        &Patch::Apply(claim),
    )
    .await?;
    Ok(())
}

/// Delete the placement document first (stops future propagation), then the
/// TrainJob. Resources already gone are tolerated and logged, never
/// escalated; the derived storage claim is left in place for reuse.
async fn delete(client: &Client, name: &str, namespace: &str) -> Result<()> {
    match delete_dynamic(client, namespace, &propagation_api_resource(), name).await {
        Ok(_) => {}
        Err(e) => {
            // The TrainJob deletion below also tears down propagated copies,
            // so a failed placement delete is not fatal to the operation.
            warn!(job = %name, error = %e, "placement deletion failed, continuing");
        }
    }

    delete_dynamic(client, namespace, &trainjob_api_resource(), name).await?;
    info!(job = %name, namespace = %namespace, "deleted training job");
    Ok(())
}
