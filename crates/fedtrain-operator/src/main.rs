//! fedtrain operator binary
//!
//! `run` connects to the federation control plane and drives the status
//! reconciler until SIGINT. `submit`, `delete`, and `status` are one-shot
//! job-lifecycle commands against the same control plane.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use kube::Client;
use tokio::sync::watch;
use tracing::info;

use fedtrain_common::job::TrainingJobSpec;
use fedtrain_engine::{
    ClusterRegistry, ConfigMapStatusStore, InMemoryStatusStore, JobEngine, JobStatusStore,
    ReconcilerConfig, StatusReconciler,
};

/// Which backend keeps the synthesized job-status records
#[derive(Clone, Copy, Debug, ValueEnum)]
enum StoreBackend {
    /// Managed ConfigMap per job; survives restarts and rejected submissions
    Configmap,
    /// Process-local memory; lost on restart
    Memory,
}

#[derive(Parser, Debug)]
#[command(name = "fedtrain-operator", about = "Federated training-job operator")]
struct Args {
    /// Status-record backend
    #[arg(long, env = "FEDTRAIN_STORE", value_enum, default_value_t = StoreBackend::Configmap)]
    store: StoreBackend,

    /// Emit logs as JSON
    #[arg(long, env = "FEDTRAIN_LOG_JSON", default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the status reconciler until interrupted
    Run {
        /// Seconds between reconciler scans
        #[arg(long, env = "FEDTRAIN_TICK_INTERVAL", default_value_t = 30)]
        tick_interval: u64,

        /// Per-job status query timeout in seconds
        #[arg(long, env = "FEDTRAIN_QUERY_TIMEOUT", default_value_t = 5)]
        query_timeout: u64,

        /// Concurrent status queries per scan
        #[arg(long, env = "FEDTRAIN_CONCURRENCY", default_value_t = 8)]
        concurrency: usize,
    },
    /// Submit a training job from a JSON request file
    Submit {
        /// Path to the job request document
        #[arg(long, short)]
        file: PathBuf,

        /// Target member clusters; repeatable, empty means any ready cluster
        #[arg(long = "cluster")]
        clusters: Vec<String>,
    },
    /// Delete a training job and its placement
    Delete {
        name: String,
        #[arg(long, short, default_value = "default")]
        namespace: String,
    },
    /// Print the last reconciled status of a job
    Status {
        name: String,
        #[arg(long, short, default_value = "default")]
        namespace: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    fedtrain_common::telemetry::init(args.log_json)?;

    let client = Client::try_default().await?;
    let store: Arc<dyn JobStatusStore> = match args.store {
        StoreBackend::Configmap => Arc::new(ConfigMapStatusStore::new(client.clone())),
        StoreBackend::Memory => Arc::new(InMemoryStatusStore::new()),
    };

    match args.command {
        Command::Run {
            tick_interval,
            query_timeout,
            concurrency,
        } => {
            let reconciler = StatusReconciler::new(
                client.clone(),
                store,
                ClusterRegistry::new(client),
                ReconcilerConfig {
                    tick_interval: Duration::from_secs(tick_interval),
                    query_timeout: Duration::from_secs(query_timeout),
                    concurrency,
                },
            );

            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let reconciler_task = tokio::spawn(async move {
                reconciler.run(shutdown_rx).await;
            });

            tokio::signal::ctrl_c().await?;
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
            reconciler_task.await?;
        }
        Command::Submit { file, clusters } => {
            let raw = tokio::fs::read_to_string(&file).await?;
            let spec: TrainingJobSpec = serde_json::from_str(&raw)?;
            let engine = JobEngine::new(client, store);
            let receipt = engine.submit_job(&spec, &clusters).await?;
            println!("{} {}", receipt.job_id, receipt.status.phase);
        }
        Command::Delete { name, namespace } => {
            let engine = JobEngine::new(client, store);
            engine.delete_job(&name, &namespace).await?;
            println!("deleted {namespace}/{name}");
        }
        Command::Status { name, namespace } => {
            let engine = JobEngine::new(client, store);
            match engine.get_job_status(&name, &namespace).await? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => println!("{namespace}/{name}: not found"),
            }
        }
    }

    Ok(())
}
