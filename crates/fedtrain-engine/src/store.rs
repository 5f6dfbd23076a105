//! Job-status store
//!
//! The engine has no durable store of its own; remote cluster state is the
//! source of truth and the status record is the synthesized view. Two
//! backend generations implement the same contract: an in-memory store (the
//! embedded generation, also used by tests) and a ConfigMap-backed store
//! that keeps one managed ConfigMap per job on the control plane (the
//! stateless generation). The reconciler depends only on the trait.
//!
//! The status ConfigMap deliberately lives outside the TrainJob object: a
//! submission the control plane rejects leaves no TrainJob behind, and the
//! Failed record must still be persistable and queryable afterwards.
//!
//! The store must serialize writes per job ID: there is exactly one logical
//! writer per job (the engine at submission, the reconciler afterwards).

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::Client;
use tracing::warn;

use fedtrain_common::kube_utils::is_not_found;
use fedtrain_common::status::JobStatusRecord;
use fedtrain_common::{
    Error, Result, FIELD_MANAGER, LABEL_COMPONENT, LABEL_MANAGED_BY, LABEL_MANAGED_BY_FEDTRAIN,
    LABEL_NAME, STATUS_COMPONENT, STATUS_CONFIGMAP_PREFIX, STATUS_LABEL_SELECTOR,
};

/// Data key under which the record is stored in the ConfigMap
const RECORD_KEY: &str = "record";

/// Identity of one tracked job
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct JobRef {
    pub name: String,
    pub namespace: String,
}

impl JobRef {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

/// Per-job get/set/list-active contract shared by both store generations
#[async_trait]
pub trait JobStatusStore: Send + Sync {
    /// Last persisted record for a job, if any
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<JobStatusRecord>>;

    /// Persist a record for a job
    async fn set(&self, namespace: &str, name: &str, record: &JobStatusRecord) -> Result<()>;

    /// All jobs not yet in a terminal phase
    async fn list_active(&self) -> Result<Vec<JobRef>>;
}

/// In-memory store: the embedded-generation backend and the test double
#[derive(Default)]
pub struct InMemoryStatusStore {
    jobs: RwLock<BTreeMap<JobRef, JobStatusRecord>>,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStatusStore for InMemoryStatusStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<JobStatusRecord>> {
        let jobs = self
            .jobs
            .read()
            .map_err(|_| Error::internal_with_context("store", "lock poisoned"))?;
        Ok(jobs.get(&JobRef::new(name, namespace)).cloned())
    }

    async fn set(&self, namespace: &str, name: &str, record: &JobStatusRecord) -> Result<()> {
        let mut jobs = self
            .jobs
            .write()
            .map_err(|_| Error::internal_with_context("store", "lock poisoned"))?;
        jobs.insert(JobRef::new(name, namespace), record.clone());
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<JobRef>> {
        let jobs = self
            .jobs
            .read()
            .map_err(|_| Error::internal_with_context("store", "lock poisoned"))?;
        Ok(jobs
            .iter()
            .filter(|(_, record)| !record.phase.is_terminal())
            .map(|(job, _)| job.clone())
            .collect())
    }
}

/// ConfigMap-backed store: one managed ConfigMap per job, so the engine
/// itself stays stateless and a record survives even when the TrainJob was
/// never admitted
pub struct ConfigMapStatusStore {
    client: Client,
}

impl ConfigMapStatusStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<ConfigMap> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Name of the status ConfigMap for a job
fn configmap_name(job_name: &str) -> String {
    format!("{STATUS_CONFIGMAP_PREFIX}{job_name}")
}

/// Build the status ConfigMap document for one job
fn status_configmap(name: &str, namespace: &str, record: &JobStatusRecord) -> Result<ConfigMap> {
    let raw = serde_json::to_string(record)
        .map_err(|e| Error::serialization_for_kind("JobStatusRecord", e.to_string()))?;
    Ok(ConfigMap {
        metadata: ObjectMeta {
            name: Some(configmap_name(name)),
            namespace: Some(namespace.to_string()),
            labels: Some(BTreeMap::from([
                (
                    LABEL_MANAGED_BY.to_string(),
                    LABEL_MANAGED_BY_FEDTRAIN.to_string(),
                ),
                (LABEL_COMPONENT.to_string(), STATUS_COMPONENT.to_string()),
                (LABEL_NAME.to_string(), name.to_string()),
            ])),
            ..Default::default()
        },
        data: Some(BTreeMap::from([(RECORD_KEY.to_string(), raw)])),
        ..Default::default()
    })
}

fn parse_record(cm: &ConfigMap) -> Option<JobStatusRecord> {
    let raw = cm.data.as_ref()?.get(RECORD_KEY)?;
    match serde_json::from_str(raw) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(
                configmap = cm.metadata.name.as_deref().unwrap_or("unknown"),
                error = %e,
                "unparseable status record, treating as absent"
            );
            None
        }
    }
}

/// Job reference for a status ConfigMap that is still active. None when the
/// record is terminal or the ConfigMap lacks its identifying metadata; a
/// missing or unparseable record counts as active so the job is not
/// silently dropped from the polling set.
fn active_job_ref(cm: &ConfigMap) -> Option<JobRef> {
    let terminal = parse_record(cm)
        .map(|r| r.phase.is_terminal())
        .unwrap_or(false);
    if terminal {
        return None;
    }
    let namespace = cm.metadata.namespace.clone()?;
    let name = cm.metadata.labels.as_ref()?.get(LABEL_NAME)?.clone();
    Some(JobRef { name, namespace })
}

#[async_trait]
impl JobStatusStore for ConfigMapStatusStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<JobStatusRecord>> {
        match self.api(namespace).get(&configmap_name(name)).await {
            Ok(cm) => Ok(parse_record(&cm)),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, namespace: &str, name: &str, record: &JobStatusRecord) -> Result<()> {
        let cm = status_configmap(name, namespace, record)?;
        // Apply creates the ConfigMap when absent, so the first write works
        // even for a job whose TrainJob was rejected at submission.
        self.api(namespace)
            .patch(
                &configmap_name(name),
                &PatchParams::apply(FIELD_MANAGER).force(),
                &Patch::Apply(&cm),
            )
            .await?;
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<JobRef>> {
        let api: Api<ConfigMap> = Api::all(self.client.clone());
        let params = ListParams::default().labels(STATUS_LABEL_SELECTOR);
        let configmaps = api.list(&params).await?;
        Ok(configmaps.iter().filter_map(active_job_ref).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedtrain_common::status::JobPhase;

    #[tokio::test]
    async fn in_memory_get_set_round_trip() {
        let store = InMemoryStatusStore::new();
        assert!(store.get("default", "iris-test").await.unwrap().is_none());

        let record = JobStatusRecord::pending();
        store.set("default", "iris-test", &record).await.unwrap();
        assert_eq!(
            store.get("default", "iris-test").await.unwrap(),
            Some(record)
        );
    }

    #[tokio::test]
    async fn list_active_excludes_terminal_jobs() {
        let store = InMemoryStatusStore::new();

        store
            .set("default", "pending-job", &JobStatusRecord::pending())
            .await
            .unwrap();

        let mut running = JobStatusRecord::pending();
        running.advance(JobPhase::Running, "cluster is running");
        store.set("default", "running-job", &running).await.unwrap();

        let mut done = JobStatusRecord::pending();
        done.advance(JobPhase::Succeeded, "completed successfully");
        store.set("default", "done-job", &done).await.unwrap();

        let mut active = store.list_active().await.unwrap();
        active.sort();
        assert_eq!(
            active,
            vec![
                JobRef::new("pending-job", "default"),
                JobRef::new("running-job", "default"),
            ]
        );
    }

    #[tokio::test]
    async fn jobs_are_scoped_by_namespace() {
        let store = InMemoryStatusStore::new();
        store
            .set("team-a", "job", &JobStatusRecord::pending())
            .await
            .unwrap();
        assert!(store.get("team-b", "job").await.unwrap().is_none());
    }

    #[test]
    fn status_configmap_round_trips_the_record() {
        let mut record = JobStatusRecord::pending();
        record.advance(JobPhase::Running, "cluster is running");

        let cm = status_configmap("iris-test", "default", &record).unwrap();
        assert_eq!(
            cm.metadata.name.as_deref(),
            Some("fedtrain-status-iris-test")
        );
        assert_eq!(parse_record(&cm), Some(record));

        let labels = cm.metadata.labels.as_ref().unwrap();
        assert_eq!(labels[LABEL_COMPONENT], STATUS_COMPONENT);
        assert_eq!(labels[LABEL_NAME], "iris-test");
    }

    #[test]
    fn record_object_is_independent_of_the_trainjob() {
        // A rejected submission leaves no TrainJob behind, so the record
        // must live on an object that does not share its lifecycle.
        let record = JobStatusRecord::failed_submission("trainjobs is forbidden");
        let cm = status_configmap("iris-test", "default", &record).unwrap();
        assert_ne!(cm.metadata.name.as_deref(), Some("iris-test"));
        assert_eq!(parse_record(&cm).unwrap().phase, JobPhase::Failed);
    }

    #[test]
    fn active_ref_skips_terminal_records() {
        let mut done = JobStatusRecord::pending();
        done.advance(JobPhase::Succeeded, "completed successfully");
        let cm = status_configmap("iris-test", "default", &done).unwrap();
        assert!(active_job_ref(&cm).is_none());

        let cm = status_configmap("iris-test", "default", &JobStatusRecord::pending()).unwrap();
        assert_eq!(
            active_job_ref(&cm),
            Some(JobRef::new("iris-test", "default"))
        );
    }

    #[test]
    fn unparseable_record_counts_as_active() {
        let mut cm = status_configmap("iris-test", "default", &JobStatusRecord::pending()).unwrap();
        cm.data
            .as_mut()
            .unwrap()
            .insert(RECORD_KEY.to_string(), "not json".to_string());

        assert!(parse_record(&cm).is_none());
        assert_eq!(
            active_job_ref(&cm),
            Some(JobRef::new("iris-test", "default"))
        );
    }
}
