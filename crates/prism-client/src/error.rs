//! Prism client errors

use thiserror::Error;

/// Errors that can occur when interacting with the Prism Central API
#[derive(Debug, Error)]
pub enum PrismError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Prism Central returned a non-2xx response
    #[error("Prism API error: {0}")]
    Api(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Name or UUID resolved to zero entities
    #[error("Not found: {0}")]
    NotFound(String),

    /// Name resolved to more than one entity and no disambiguating UUID was given
    #[error("Multiple {kind} entities named '{name}' exist: {uuids:?}")]
    AmbiguousName {
        /// Entity kind the lookup was scoped to
        kind: String,
        /// The ambiguous name
        name: String,
        /// UUIDs of every entity carrying the name
        uuids: Vec<String>,
    },

    /// Invalid request (e.g., missing or mutually exclusive fields)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Asynchronous task reached terminal FAILED state
    #[error("Task {task_uuid} failed: {detail}")]
    TaskFailed {
        /// UUID of the failed task
        task_uuid: String,
        /// Failure detail reported by Prism Central
        detail: String,
    },

    /// Task did not reach a terminal state within the polling budget
    #[error("Task {task_uuid} still not terminal after {attempts} polls")]
    PollTimeout {
        /// UUID of the task being polled
        task_uuid: String,
        /// Number of polls issued before giving up
        attempts: u32,
    },
}

impl PrismError {
    /// Whether the error is worth retrying on the polling cadence: transport
    /// failures and non-2xx responses from a gateway mid-poll both clear up
    /// on their own, unlike resolution or task failures.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Api(_))
    }
}
