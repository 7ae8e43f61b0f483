//! Subnet reconciler

use super::{Outcome, Reconciler, mutation_ids};
use crate::builder;
use crate::diff::{ReconcileState, diff_subnet};
use crate::error::ControllerError;
use crate::params::{State, SubnetParams};
use prism_client::{EntityKind, PrismError, resolve};
use tracing::{debug, info};

impl Reconciler {
    /// Reconcile one declared subnet operation.
    ///
    /// # Errors
    /// Resolution, configuration, conflict, API and task failures.
    pub async fn reconcile_subnet(
        &self,
        params: &SubnetParams,
    ) -> Result<Outcome, ControllerError> {
        match params.state {
            State::Present => self.subnet_present(params).await,
            State::Absent => self.subnet_absent(params).await,
            State::Poweron | State::Poweroff => Err(ControllerError::InvalidConfig(
                "subnets have no power state".to_string(),
            )),
        }
    }

    async fn locate_subnet(&self, params: &SubnetParams) -> Result<Option<String>, ControllerError> {
        if let Some(uuid) = &params.subnet_uuid {
            return Ok(Some(uuid.clone()));
        }
        let name = subnet_name(params)?;
        let mut uuids =
            resolve::find_uuids_by_name(self.client.as_ref(), EntityKind::Subnet, name).await?;
        match uuids.len() {
            0 => Ok(None),
            1 => Ok(Some(uuids.remove(0))),
            _ => Err(PrismError::AmbiguousName {
                kind: "subnet".to_string(),
                name: name.to_string(),
                uuids,
            }
            .into()),
        }
    }

    async fn subnet_present(&self, params: &SubnetParams) -> Result<Outcome, ControllerError> {
        match self.locate_subnet(params).await? {
            None => self.subnet_create(params).await,
            Some(uuid) => self.subnet_update(params, &uuid).await,
        }
    }

    async fn subnet_create(&self, params: &SubnetParams) -> Result<Outcome, ControllerError> {
        let name = subnet_name(params)?;
        if params.vlan_id.is_none() {
            return Err(ControllerError::InvalidConfig(
                "vlan_id is required to create a subnet".to_string(),
            ));
        }
        if params.cluster.is_none() {
            return Err(ControllerError::InvalidConfig(
                "a cluster is required to create a subnet".to_string(),
            ));
        }

        let payload = builder::build_subnet_payload(self.client.as_ref(), params).await?;

        if params.dry_run {
            return Ok(Outcome {
                changed: true,
                msg: Some(format!("Subnet '{name}' would be created")),
                spec: Some(serde_json::to_value(&payload)?),
                ..Outcome::default()
            });
        }

        info!("Creating subnet '{}'", name);
        let response = self.client.create_subnet(&payload).await?;
        let (subnet_uuid, task_uuid) = mutation_ids(&response)?;
        self.wait_for_task(&task_uuid).await?;

        info!("Created subnet '{}' ({:?})", name, subnet_uuid);
        Ok(Outcome {
            changed: true,
            msg: Some(format!("Subnet '{name}' created")),
            subnet_uuid,
            task_uuid: Some(task_uuid),
            ..Outcome::default()
        })
    }

    async fn subnet_update(
        &self,
        params: &SubnetParams,
        uuid: &str,
    ) -> Result<Outcome, ControllerError> {
        // Reference resolution happens first; the observed state is fetched
        // immediately before diffing.
        let desired = builder::build_subnet_payload(self.client.as_ref(), params).await?;
        let observed = self.client.get_subnet(uuid).await?;

        let payload = match diff_subnet(&desired, &observed, params.ip_config.is_some()) {
            ReconcileState::Unchanged => {
                debug!("Subnet {} already matches the declared state", uuid);
                return Ok(Outcome {
                    subnet_uuid: Some(uuid.to_string()),
                    ..Outcome::unchanged("Subnet already in desired state")
                });
            }
            ReconcileState::Conflict(reason) => return Err(ControllerError::Conflict(reason)),
            ReconcileState::Changed { payload, .. } => payload,
        };

        if params.dry_run {
            return Ok(Outcome {
                changed: true,
                subnet_uuid: Some(uuid.to_string()),
                msg: Some("Subnet would be updated".to_string()),
                spec: Some(serde_json::to_value(&payload)?),
                ..Outcome::default()
            });
        }

        info!("Updating subnet {}", uuid);
        let response = self.client.update_subnet(uuid, &payload).await?;
        let (_, task_uuid) = mutation_ids(&response)?;
        self.wait_for_task(&task_uuid).await?;

        Ok(Outcome {
            changed: true,
            msg: Some("Subnet updated".to_string()),
            subnet_uuid: Some(uuid.to_string()),
            task_uuid: Some(task_uuid),
            ..Outcome::default()
        })
    }

    async fn subnet_absent(&self, params: &SubnetParams) -> Result<Outcome, ControllerError> {
        let Some(uuid) = self.locate_subnet(params).await? else {
            return Ok(Outcome::unchanged(
                "Subnet does not exist, nothing to delete",
            ));
        };

        if params.dry_run {
            return Ok(Outcome {
                changed: true,
                subnet_uuid: Some(uuid),
                msg: Some("Subnet would be deleted".to_string()),
                ..Outcome::default()
            });
        }

        info!("Deleting subnet {}", uuid);
        let response = self.client.delete_subnet(&uuid).await?;
        let (_, task_uuid) = mutation_ids(&response)?;
        self.wait_for_task(&task_uuid).await?;

        Ok(Outcome {
            changed: true,
            msg: Some("Subnet deleted".to_string()),
            subnet_uuid: Some(uuid),
            task_uuid: Some(task_uuid),
            ..Outcome::default()
        })
    }
}

fn subnet_name(params: &SubnetParams) -> Result<&str, ControllerError> {
    params
        .name
        .as_deref()
        .ok_or_else(|| ControllerError::InvalidConfig("subnet name is required".to_string()))
}
