//! Canonical job status records
//!
//! `JobStatusRecord` is the reconciled view of one training job. It is
//! written by the engine exactly once at submission (Pending, or Failed on a
//! rejected write) and thereafter only by the status reconciler. The phase
//! machine is monotonic: Pending → Running → {Succeeded, Failed}, plus
//! Stopped reachable from any non-terminal phase via explicit deletion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle phase of a training job
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum JobPhase {
    /// Submitted, not yet observed running on any member cluster
    #[default]
    Pending,
    /// Observed running on a member cluster
    Running,
    /// Completed successfully
    Succeeded,
    /// Failed on the cluster or rejected at submission
    Failed,
    /// Explicitly deleted before completion
    Stopped,
}

impl JobPhase {
    /// Terminal phases are never left and never polled again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Stopped)
    }

    /// Position in the monotonic partial order
    /// Pending < Running < {Succeeded, Failed, Stopped}
    pub fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Running => 1,
            Self::Succeeded | Self::Failed | Self::Stopped => 2,
        }
    }
}

impl std::fmt::Display for JobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Running => write!(f, "Running"),
            Self::Succeeded => write!(f, "Succeeded"),
            Self::Failed => write!(f, "Failed"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Canonical status of one training job
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusRecord {
    /// Current phase
    #[serde(default)]
    pub phase: JobPhase,

    /// Human-readable message about the current state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// When the job was first observed Running
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// When the job reached a terminal phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Active replica counts per member cluster, where observed
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cluster_replicas: BTreeMap<String, i32>,
}

impl JobStatusRecord {
    /// The only legal initial record
    pub fn pending() -> Self {
        Self {
            phase: JobPhase::Pending,
            message: Some("job submitted".to_string()),
            ..Default::default()
        }
    }

    /// A record for a job whose submission was rejected
    pub fn failed_submission(message: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            phase: JobPhase::Failed,
            message: Some(message.into()),
            completed_at: Some(now),
            ..Default::default()
        }
    }

    /// Move this record to `phase`, stamping start/completion times on the
    /// relevant edges. Callers are expected to have checked monotonicity;
    /// this only records the transition.
    pub fn advance(&mut self, phase: JobPhase, message: impl Into<String>) {
        let now = Utc::now();
        if phase == JobPhase::Running && self.started_at.is_none() {
            self.started_at = Some(now);
        }
        if phase.is_terminal() && self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
        self.phase = phase;
        self.message = Some(message.into());
    }
}
