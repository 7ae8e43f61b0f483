//! Lifecycle orchestration for Prism Central resources.
//!
//! One module per resource kind:
//! - `vm`: create/update/delete and power transitions, including the
//!   power-off-before-shrink sequence
//! - `subnet`: create/update/delete with VLAN/cluster immutability
//! - `image`: create/rename/retype/delete with duplicate-name handling
//!
//! Every mutating call yields a task UUID which is polled to a terminal state
//! before the operation reports back. Resolution and build failures happen
//! before the first mutating call, so they abort with no partial side effect.

pub mod image;
pub mod subnet;
pub mod vm;

use crate::error::ControllerError;
use crate::params::Operation;
use prism_client::prism_trait::PrismApi;
use prism_client::{MutationResponse, PollOptions, PrismError, poll_task};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Result of one reconciliation operation, reported to the caller.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Outcome {
    /// Whether any mutating call was issued (or would be, under dry run)
    pub changed: bool,
    /// Set on failure paths surfaced as results rather than process errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<bool>,
    /// Human-readable summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    /// UUID of the VM the operation acted on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vm_uuid: Option<String>,
    /// UUID of the subnet the operation acted on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_uuid: Option<String>,
    /// UUID of the image the operation acted on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_uuid: Option<String>,
    /// UUID of the last task driven to completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_uuid: Option<String>,
    /// First IP reported on the VM's first NIC after create
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// The payload that would be submitted, reported under dry run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<serde_json::Value>,
}

impl Outcome {
    /// A no-op outcome: observed state already matches.
    pub fn unchanged(msg: impl Into<String>) -> Self {
        Self {
            changed: false,
            msg: Some(msg.into()),
            ..Self::default()
        }
    }

    /// A failure outcome carrying a human-readable message.
    pub fn failure(msg: impl Into<String>) -> Self {
        Self {
            changed: false,
            failed: Some(true),
            msg: Some(msg.into()),
            ..Self::default()
        }
    }
}

/// Reconciles declared desired state against Prism Central.
pub struct Reconciler {
    pub(crate) client: Arc<dyn PrismApi>,
    pub(crate) poll: PollOptions,
    pub(crate) ip_wait_attempts: u32,
    pub(crate) ip_wait_interval: Duration,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler").finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Create a reconciler with default polling budgets.
    pub fn new(client: Arc<dyn PrismApi>) -> Self {
        Self {
            client,
            poll: PollOptions::default(),
            ip_wait_attempts: 60,
            ip_wait_interval: Duration::from_secs(5),
        }
    }

    /// Override the task polling budget.
    #[must_use]
    pub fn with_poll_options(mut self, poll: PollOptions) -> Self {
        self.poll = poll;
        self
    }

    /// Override the post-create IP wait budget.
    #[must_use]
    pub fn with_ip_wait(mut self, attempts: u32, interval: Duration) -> Self {
        self.ip_wait_attempts = attempts;
        self.ip_wait_interval = interval;
        self
    }

    /// Run one declared operation to completion.
    ///
    /// # Errors
    /// Any resolution, configuration, conflict, API or task failure.
    pub async fn run(&self, operation: &Operation) -> Result<Outcome, ControllerError> {
        match operation {
            Operation::Vm(params) => self.reconcile_vm(params).await,
            Operation::Subnet(params) => self.reconcile_subnet(params).await,
            Operation::Image(params) => self.reconcile_image(params).await,
        }
    }

    /// Drive one task to a terminal state under the configured budget.
    pub(crate) async fn wait_for_task(&self, task_uuid: &str) -> Result<(), ControllerError> {
        poll_task(self.client.as_ref(), task_uuid, &self.poll).await?;
        Ok(())
    }
}

/// Pull the entity and task UUIDs out of a mutation response.
pub(crate) fn mutation_ids(
    response: &MutationResponse,
) -> Result<(Option<String>, String), ControllerError> {
    let task_uuid = response.task_uuid().ok_or_else(|| {
        PrismError::Api("mutation response carried no task uuid".to_string())
    })?;
    Ok((
        response.entity_uuid().map(String::from),
        task_uuid.to_string(),
    ))
}

mod vm_test;
