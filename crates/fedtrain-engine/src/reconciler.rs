//! Status reconciliation loop
//!
//! One fixed-interval timer per process scans every job not yet in a
//! terminal phase, queries its live status on a member cluster through the
//! Karmada aggregation proxy, maps the native status onto the canonical
//! phase machine, and persists the transition. The scan fans out with
//! bounded concurrency so one unreachable cluster cannot stall the whole
//! tick; each query also carries its own short timeout.
//!
//! Transitions are monotonic. A stale or ambiguous observation holds the
//! last known phase and retries on the next tick — including not-found,
//! because propagation to a member cluster is itself asynchronous and may
//! lag the control-plane write. Query failures retry indefinitely with no
//! backoff; a permanently unreachable cluster leaves its jobs in the last
//! known non-terminal phase until they are deleted.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use kube::api::{Api, DynamicObject};
use kube::Client;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use fedtrain_common::kube_utils::{is_not_found, propagation_api_resource};
use fedtrain_common::status::JobPhase;
use fedtrain_common::Result;
use fedtrain_resource::TrainJob;

use crate::registry::ClusterRegistry;
use crate::store::{JobRef, JobStatusStore};

/// Reconciler tuning knobs
#[derive(Clone, Debug)]
pub struct ReconcilerConfig {
    /// Scan cadence; also the freshness bound of `get_job_status`
    pub tick_interval: Duration,
    /// Per-job proxied status query timeout
    pub query_timeout: Duration,
    /// Bounded fan-out within one tick
    pub concurrency: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(30),
            query_timeout: Duration::from_secs(5),
            concurrency: 8,
        }
    }
}

/// One status observation of a job on a member cluster
#[derive(Clone, Debug, PartialEq)]
pub enum Observation {
    /// The member cluster does not (yet) have the resource
    NotFound,
    /// The query failed or timed out
    QueryFailed(String),
    /// The member cluster reported a native status
    Reported {
        state: Option<String>,
        deploy_state: Option<String>,
        active: Option<i32>,
    },
}

/// The background status reconciler
pub struct StatusReconciler {
    client: Client,
    store: Arc<dyn JobStatusStore>,
    registry: ClusterRegistry,
    config: ReconcilerConfig,
}

impl StatusReconciler {
    pub fn new(
        client: Client,
        store: Arc<dyn JobStatusStore>,
        registry: ClusterRegistry,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            client,
            store,
            registry,
            config,
        }
    }

    /// Run until the shutdown signal flips to true.
    ///
    /// Cancellation is cooperative: the signal is checked between ticks and
    /// a scan already in flight always runs to completion.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut tick = tokio::time::interval(self.config.tick_interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!(
            interval_secs = self.config.tick_interval.as_secs(),
            concurrency = self.config.concurrency,
            "status reconciler started"
        );

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.scan().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("status reconciler stopping");
                        return;
                    }
                }
            }
        }
    }

    /// One scan over all non-terminal jobs
    pub async fn scan(&self) {
        let jobs = match self.store.list_active().await {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!(error = %e, "failed to list active jobs, skipping tick");
                return;
            }
        };
        if jobs.is_empty() {
            return;
        }
        debug!(jobs = jobs.len(), "scanning active jobs");

        futures::stream::iter(jobs)
            .for_each_concurrent(self.config.concurrency, |job| async move {
                self.reconcile_job(&job).await;
            })
            .await;
    }

    async fn reconcile_job(&self, job: &JobRef) {
        let candidates = match self.candidate_clusters(job).await {
            Ok(c) => c,
            Err(e) => {
                warn!(job = %job.name, error = %e, "cannot resolve candidate clusters");
                return;
            }
        };
        let Some(cluster) = candidates.first() else {
            debug!(job = %job.name, "no candidate clusters, retrying next tick");
            return;
        };

        let observation = self.observe(cluster, job).await;
        if let Err(e) = apply_observation(self.store.as_ref(), job, cluster, &observation).await {
            warn!(job = %job.name, error = %e, "failed to persist status transition");
        }
    }

    /// Candidate clusters for a job: the affinity list of its placement
    /// document, falling back to all ready clusters when the placement was
    /// unconstrained or is missing
    async fn candidate_clusters(&self, job: &JobRef) -> Result<Vec<String>> {
        let api: Api<DynamicObject> = Api::namespaced_with(
            self.client.clone(),
            &job.namespace,
            &propagation_api_resource(),
        );
        match api.get(&job.name).await {
            Ok(policy) => {
                let names: Vec<String> = policy
                    .data
                    .pointer("/spec/placement/clusterAffinity/clusterNames")
                    .and_then(|v| v.as_array())
                    .map(|a| {
                        a.iter()
                            .filter_map(|n| n.as_str().map(str::to_string))
                            .collect()
                    })
                    .unwrap_or_default();
                if names.is_empty() {
                    self.registry.ready_clusters().await
                } else {
                    Ok(names)
                }
            }
            Err(e) if is_not_found(&e) => self.registry.ready_clusters().await,
            Err(e) => Err(e.into()),
        }
    }

    /// Query one member cluster's copy of the job through the aggregation
    /// proxy, bounded by the per-job timeout
    async fn observe(&self, cluster: &str, job: &JobRef) -> Observation {
        let path = proxy_status_path(cluster, &job.namespace, &job.name);
        let request = match http::Request::get(&path).body(Vec::new()) {
            Ok(r) => r,
            Err(e) => return Observation::QueryFailed(format!("bad proxy path: {e}")),
        };

        let response =
            tokio::time::timeout(self.config.query_timeout, self.client.request::<TrainJob>(request))
                .await;
        match response {
            Err(_) => Observation::QueryFailed(format!(
                "status query to {cluster} timed out after {:?}",
                self.config.query_timeout
            )),
            Ok(Err(e)) if is_not_found(&e) => Observation::NotFound,
            Ok(Err(e)) => Observation::QueryFailed(e.to_string()),
            Ok(Ok(resource)) => {
                let status = resource.status.unwrap_or_default();
                Observation::Reported {
                    state: status.state,
                    deploy_state: status.deploy_state,
                    active: status.active,
                }
            }
        }
    }
}

/// Aggregation-proxy path for one job's resource on one member cluster
pub fn proxy_status_path(cluster: &str, namespace: &str, name: &str) -> String {
    format!(
        "/apis/cluster.karmada.io/v1alpha1/clusters/{cluster}/proxy\
         /apis/training.fedtrain.dev/v1alpha1/namespaces/{namespace}/trainjobs/{name}"
    )
}

/// Map a native cluster status onto the canonical phase machine.
///
/// The mapping is exhaustive: SUCCEEDED and FAILED are terminal, RUNNING is
/// Running with the nested deployment-status detail, anything else is
/// Running when the nested deployment status says "Running" and Pending
/// otherwise, carrying the deployment status verbatim.
pub fn map_native_status(state: Option<&str>, deploy_state: Option<&str>) -> (JobPhase, String) {
    match state {
        Some("SUCCEEDED") => (JobPhase::Succeeded, "completed successfully".to_string()),
        Some("FAILED") => (JobPhase::Failed, "job failed".to_string()),
        Some("RUNNING") => (
            JobPhase::Running,
            format!(
                "cluster reports running, deployment {}",
                deploy_state.unwrap_or("unknown")
            ),
        ),
        _ => {
            if deploy_state == Some("Running") {
                (JobPhase::Running, "cluster is running".to_string())
            } else {
                (
                    JobPhase::Pending,
                    format!(
                        "waiting on cluster, deployment {}",
                        deploy_state.unwrap_or("not reported")
                    ),
                )
            }
        }
    }
}

/// Decide whether an observation produces a transition from `current`.
///
/// Not-found and failed queries never do — the job holds its last known
/// phase and retries next tick. A reported status only produces a
/// transition when the mapped phase differs from the current one and does
/// not move backward in the partial order.
pub fn decide(current: JobPhase, observation: &Observation) -> Option<(JobPhase, String)> {
    let Observation::Reported {
        state, deploy_state, ..
    } = observation
    else {
        return None;
    };

    let (phase, message) = map_native_status(state.as_deref(), deploy_state.as_deref());
    if phase == current {
        return None;
    }
    if phase.rank() < current.rank() {
        debug!(
            current = %current,
            observed = %phase,
            "ignoring backward status observation"
        );
        return None;
    }
    Some((phase, message))
}

/// Apply one observation to the store. Returns whether a write happened —
/// a transition is persisted if and only if the newly computed phase
/// differs from the last persisted one.
pub(crate) async fn apply_observation(
    store: &dyn JobStatusStore,
    job: &JobRef,
    cluster: &str,
    observation: &Observation,
) -> Result<bool> {
    let Some(record) = store.get(&job.namespace, &job.name).await? else {
        debug!(job = %job.name, "no status record, skipping");
        return Ok(false);
    };
    if record.phase.is_terminal() {
        return Ok(false);
    }

    let Some((phase, message)) = decide(record.phase, observation) else {
        return Ok(false);
    };

    let mut updated = record.clone();
    updated.advance(phase, message);
    if let Observation::Reported {
        active: Some(n), ..
    } = observation
    {
        updated.cluster_replicas.insert(cluster.to_string(), *n);
    }
    store.set(&job.namespace, &job.name, &updated).await?;
    info!(
        job = %job.name,
        namespace = %job.namespace,
        cluster = %cluster,
        "status changed: {} -> {}",
        record.phase,
        updated.phase
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStatusStore;
    use fedtrain_common::status::JobStatusRecord;

    fn reported(state: Option<&str>, deploy: Option<&str>) -> Observation {
        Observation::Reported {
            state: state.map(str::to_string),
            deploy_state: deploy.map(str::to_string),
            active: None,
        }
    }

    #[test]
    fn mapping_table_is_exact() {
        assert_eq!(
            map_native_status(Some("SUCCEEDED"), None),
            (JobPhase::Succeeded, "completed successfully".to_string())
        );
        assert_eq!(
            map_native_status(Some("FAILED"), Some("Running")),
            (JobPhase::Failed, "job failed".to_string())
        );

        let (phase, message) = map_native_status(Some("RUNNING"), Some("Running"));
        assert_eq!(phase, JobPhase::Running);
        assert!(message.contains("Running"));

        assert_eq!(
            map_native_status(Some("PENDING"), Some("Running")),
            (JobPhase::Running, "cluster is running".to_string())
        );
        assert_eq!(
            map_native_status(None, Some("Running")),
            (JobPhase::Running, "cluster is running".to_string())
        );

        let (phase, message) = map_native_status(Some("PENDING"), Some("Creating"));
        assert_eq!(phase, JobPhase::Pending);
        assert!(message.contains("Creating"));

        let (phase, _) = map_native_status(None, None);
        assert_eq!(phase, JobPhase::Pending);
    }

    #[test]
    fn canonical_phases_never_move_backward() {
        // A stale PENDING observation while Running holds the phase
        assert_eq!(
            decide(JobPhase::Running, &reported(Some("PENDING"), Some("Creating"))),
            None
        );
        // And a terminal phase is never left via polling
        assert_eq!(
            decide(JobPhase::Succeeded, &reported(Some("RUNNING"), Some("Running"))),
            None
        );
    }

    #[test]
    fn identical_phase_produces_no_transition() {
        assert_eq!(
            decide(JobPhase::Running, &reported(Some("RUNNING"), Some("Running"))),
            None
        );
    }

    #[test]
    fn ambiguous_signals_hold_the_last_state() {
        assert_eq!(decide(JobPhase::Running, &Observation::NotFound), None);
        assert_eq!(
            decide(
                JobPhase::Pending,
                &Observation::QueryFailed("timeout".to_string())
            ),
            None
        );
    }

    #[test]
    fn forward_transitions_are_produced() {
        let (phase, _) = decide(
            JobPhase::Pending,
            &reported(Some("RUNNING"), Some("Running")),
        )
        .unwrap();
        assert_eq!(phase, JobPhase::Running);

        let (phase, message) = decide(
            JobPhase::Running,
            &reported(Some("SUCCEEDED"), None),
        )
        .unwrap();
        assert_eq!(phase, JobPhase::Succeeded);
        assert_eq!(message, "completed successfully");
    }

    #[test]
    fn proxy_path_shape() {
        assert_eq!(
            proxy_status_path("member-a", "default", "iris-test"),
            "/apis/cluster.karmada.io/v1alpha1/clusters/member-a/proxy\
             /apis/training.fedtrain.dev/v1alpha1/namespaces/default/trainjobs/iris-test"
        );
    }

    #[tokio::test]
    async fn running_observation_writes_once_then_settles() {
        let store = InMemoryStatusStore::new();
        let job = JobRef::new("iris-test", "default");
        store
            .set(&job.namespace, &job.name, &JobStatusRecord::pending())
            .await
            .unwrap();

        let obs = reported(Some("RUNNING"), Some("Running"));

        // First observation: exactly one write, Pending -> Running
        let wrote = apply_observation(&store, &job, "member-a", &obs)
            .await
            .unwrap();
        assert!(wrote);
        let record = store.get("default", "iris-test").await.unwrap().unwrap();
        assert_eq!(record.phase, JobPhase::Running);
        assert!(record.started_at.is_some());

        // Identical observation on the next tick: zero additional writes
        let wrote = apply_observation(&store, &job, "member-a", &obs)
            .await
            .unwrap();
        assert!(!wrote);
    }

    #[tokio::test]
    async fn not_found_leaves_the_record_untouched() {
        let store = InMemoryStatusStore::new();
        let job = JobRef::new("iris-test", "default");
        let mut record = JobStatusRecord::pending();
        record.advance(JobPhase::Running, "cluster is running");
        store
            .set(&job.namespace, &job.name, &record)
            .await
            .unwrap();

        let wrote = apply_observation(&store, &job, "member-a", &Observation::NotFound)
            .await
            .unwrap();
        assert!(!wrote);
        assert_eq!(
            store.get("default", "iris-test").await.unwrap().unwrap(),
            record
        );
    }

    #[tokio::test]
    async fn completion_records_timestamps_and_replicas() {
        let store = InMemoryStatusStore::new();
        let job = JobRef::new("iris-test", "default");
        store
            .set(&job.namespace, &job.name, &JobStatusRecord::pending())
            .await
            .unwrap();

        let running = Observation::Reported {
            state: Some("RUNNING".to_string()),
            deploy_state: Some("Running".to_string()),
            active: Some(2),
        };
        apply_observation(&store, &job, "member-a", &running)
            .await
            .unwrap();

        let done = reported(Some("SUCCEEDED"), None);
        let wrote = apply_observation(&store, &job, "member-a", &done)
            .await
            .unwrap();
        assert!(wrote);

        let record = store.get("default", "iris-test").await.unwrap().unwrap();
        assert_eq!(record.phase, JobPhase::Succeeded);
        assert!(record.phase.is_terminal());
        assert!(record.completed_at.is_some());
        assert_eq!(record.cluster_replicas.get("member-a"), Some(&2));
    }

    #[tokio::test]
    async fn terminal_records_are_never_rewritten() {
        let store = InMemoryStatusStore::new();
        let job = JobRef::new("iris-test", "default");
        let mut record = JobStatusRecord::pending();
        record.advance(JobPhase::Stopped, "job deleted");
        store
            .set(&job.namespace, &job.name, &record)
            .await
            .unwrap();

        let wrote = apply_observation(
            &store,
            &job,
            "member-a",
            &reported(Some("RUNNING"), Some("Running")),
        )
        .await
        .unwrap();
        assert!(!wrote);
    }
}
