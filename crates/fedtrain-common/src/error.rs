//! Error types for the fedtrain engine
//!
//! Errors are structured with fields to aid debugging in production.
//! Each error variant includes contextual information like job names,
//! field paths, and underlying causes.

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for fedtrain operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// Validation error for a training job spec
    ///
    /// Raised before any I/O. Never retried — the caller must fix the spec.
    #[error("validation error for {job}: {message}")]
    Validation {
        /// Name of the job with the invalid spec
        job: String,
        /// Description of what's invalid
        message: String,
        /// The invalid field path (e.g., "spec.resources.cpu")
        field: Option<String>,
    },

    /// Internal invariant violated while building a resource document
    ///
    /// Treated as a bug: surfaced, not retried.
    #[error("conversion error for {job}: {message}")]
    Conversion {
        /// Name of the job being converted
        job: String,
        /// Description of the violated invariant
        message: String,
    },

    /// Control-plane API rejected a write during submission
    ///
    /// Surfaced synchronously to the caller; the job is marked Failed.
    #[error("submission error for {job}: {message}")]
    Submission {
        /// Name of the job being submitted
        job: String,
        /// Description of what the control plane rejected
        message: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The resource kind being serialized (if known)
        kind: Option<String>,
    },

    /// Internal/operational error
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Description of what failed
        message: String,
        /// Context where the error occurred (e.g., "reconciler", "registry")
        context: String,
    },
}

impl Error {
    /// Create a validation error without job context
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            job: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
            field: None,
        }
    }

    /// Create a validation error with job context
    pub fn validation_for(job: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            job: job.into(),
            message: msg.into(),
            field: None,
        }
    }

    /// Create a validation error with job context and field path
    pub fn validation_for_field(
        job: impl Into<String>,
        field: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Validation {
            job: job.into(),
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a conversion error with job context
    pub fn conversion_for(job: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Conversion {
            job: job.into(),
            message: msg.into(),
        }
    }

    /// Create a submission error with job context
    pub fn submission_for(job: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Submission {
            job: job.into(),
            message: msg.into(),
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: None,
        }
    }

    /// Create a serialization error with resource kind context
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Create an internal error without specific context
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: UNKNOWN_CONTEXT.to_string(),
        }
    }

    /// Create an internal error with context
    pub fn internal_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Check if this error is retryable
    ///
    /// Validation, conversion, and serialization errors are not retryable
    /// (they require a spec or code fix). Submission errors are surfaced
    /// synchronously and not retried automatically. Kubernetes errors depend
    /// on the status code — transient transport errors retry, 4xx does not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube { source } => {
                !matches!(
                    source,
                    kube::Error::Api(ae) if (400..500).contains(&ae.code)
                )
            }
            Error::Validation { .. } => false,
            Error::Conversion { .. } => false,
            Error::Submission { .. } => false,
            Error::Serialization { .. } => false,
            Error::Internal { .. } => true,
        }
    }

    /// Get the job name if this error is associated with a specific job
    pub fn job(&self) -> Option<&str> {
        match self {
            Error::Validation { job, .. } => Some(job),
            Error::Conversion { job, .. } => Some(job),
            Error::Submission { job, .. } => Some(job),
            _ => None,
        }
    }
}
