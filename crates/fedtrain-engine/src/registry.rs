//! Member-cluster registry
//!
//! Read-only view over the Karmada Cluster resources registered with the
//! control plane. Consumed by placement callers and as the fallback target
//! set in the status reconciler. The registry never writes.

use kube::api::{Api, DynamicObject, ListParams};
use kube::Client;

use fedtrain_common::kube_utils::cluster_api_resource;
use fedtrain_common::Result;

/// Read-only view over registered member clusters
#[derive(Clone)]
pub struct ClusterRegistry {
    client: Client,
}

impl ClusterRegistry {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Names of all member clusters whose Ready condition is True
    pub async fn ready_clusters(&self) -> Result<Vec<String>> {
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &cluster_api_resource());
        let clusters = api.list(&ListParams::default()).await?;

        Ok(clusters
            .into_iter()
            .filter(|c| is_ready(c))
            .filter_map(|c| c.metadata.name)
            .collect())
    }
}

/// A cluster is ready when its status carries a Ready condition with
/// status "True"
fn is_ready(cluster: &DynamicObject) -> bool {
    cluster
        .data
        .get("status")
        .and_then(|s| s.get("conditions"))
        .and_then(|c| c.as_array())
        .map(|conditions| {
            conditions.iter().any(|cond| {
                cond.get("type").and_then(|t| t.as_str()) == Some("Ready")
                    && cond.get("status").and_then(|s| s.as_str()) == Some("True")
            })
        })
        .unwrap_or(false)
}
