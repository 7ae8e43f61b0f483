//! VM reconciler

use super::{Outcome, Reconciler, mutation_ids};
use crate::builder;
use crate::diff::{ReconcileState, diff_vm};
use crate::error::ControllerError;
use crate::params::{State, VmParams};
use prism_client::{
    EntityKind, PowerState, PowerStateMechanism, PrismError, VmEntity, resolve,
};
use tracing::{debug, info, warn};

impl Reconciler {
    /// Reconcile one declared VM operation.
    ///
    /// # Errors
    /// Resolution, configuration, conflict, API and task failures.
    pub async fn reconcile_vm(&self, params: &VmParams) -> Result<Outcome, ControllerError> {
        match params.state {
            State::Present => self.vm_present(params).await,
            State::Absent => self.vm_absent(params).await,
            State::Poweron => self.vm_power(params, PowerState::On).await,
            State::Poweroff => self.vm_power(params, PowerState::Off).await,
        }
    }

    /// Locate the VM the operation targets. An explicit UUID wins; a name
    /// matching several VMs is ambiguous and aborts before any mutation.
    async fn locate_vm(&self, params: &VmParams) -> Result<Option<String>, ControllerError> {
        if let Some(uuid) = &params.vm_uuid {
            return Ok(Some(uuid.clone()));
        }
        let name = vm_name(params)?;
        let mut uuids =
            resolve::find_uuids_by_name(self.client.as_ref(), EntityKind::Vm, name).await?;
        match uuids.len() {
            0 => Ok(None),
            1 => Ok(Some(uuids.remove(0))),
            _ => Err(PrismError::AmbiguousName {
                kind: "vm".to_string(),
                name: name.to_string(),
                uuids,
            }
            .into()),
        }
    }

    async fn vm_present(&self, params: &VmParams) -> Result<Outcome, ControllerError> {
        match self.locate_vm(params).await? {
            None => self.vm_create(params).await,
            Some(uuid) => self.vm_update(params, &uuid).await,
        }
    }

    async fn vm_create(&self, params: &VmParams) -> Result<Outcome, ControllerError> {
        let payload = builder::build_vm_payload(self.client.as_ref(), params).await?;
        let name = vm_name(params)?;

        if params.dry_run {
            return Ok(Outcome {
                changed: true,
                msg: Some(format!("VM '{name}' would be created")),
                spec: Some(serde_json::to_value(&payload)?),
                ..Outcome::default()
            });
        }

        info!("Creating VM '{}'", name);
        let response = self.client.create_vm(&payload).await?;
        let (vm_uuid, task_uuid) = mutation_ids(&response)?;
        self.wait_for_task(&task_uuid).await?;

        let powered_on = payload
            .spec
            .as_ref()
            .is_some_and(|s| s.resources.power_state == Some(PowerState::On));
        let has_nics = payload
            .spec
            .as_ref()
            .is_some_and(|s| !s.resources.nic_list.is_empty());
        let ip_address = match (&vm_uuid, powered_on && has_nics) {
            (Some(uuid), true) => self.wait_for_ip(uuid).await?,
            _ => None,
        };

        info!("Created VM '{}' ({:?})", name, vm_uuid);
        Ok(Outcome {
            changed: true,
            msg: Some(format!("VM '{name}' created")),
            vm_uuid,
            task_uuid: Some(task_uuid),
            ip_address,
            ..Outcome::default()
        })
    }

    /// Wait (bounded) for the first NIC to report an assigned address. DHCP
    /// may legitimately take longer than the budget, so exhaustion is not a
    /// failure.
    async fn wait_for_ip(&self, vm_uuid: &str) -> Result<Option<String>, ControllerError> {
        for attempt in 1..=self.ip_wait_attempts {
            let vm = self.client.get_vm(vm_uuid).await?;
            if let Some(ip) = vm.status.as_ref().and_then(|s| s.first_ip()) {
                debug!("VM {} reported IP {} after {} poll(s)", vm_uuid, ip, attempt);
                return Ok(Some(ip.to_string()));
            }
            tokio::time::sleep(self.ip_wait_interval).await;
        }
        warn!(
            "VM {} reported no IP after {} polls, continuing without one",
            vm_uuid, self.ip_wait_attempts
        );
        Ok(None)
    }

    async fn vm_update(&self, params: &VmParams, uuid: &str) -> Result<Outcome, ControllerError> {
        // Building the payload can take several resolution round trips, so
        // the observed state is fetched after it, immediately before diffing.
        let desired = builder::build_vm_payload(self.client.as_ref(), params).await?;
        let observed = self.client.get_vm(uuid).await?;

        let (mut payload, requires_power_off) = match diff_vm(&desired, &observed) {
            ReconcileState::Unchanged => {
                debug!("VM {} already matches the declared state", uuid);
                return Ok(Outcome {
                    vm_uuid: Some(uuid.to_string()),
                    ..Outcome::unchanged("VM already in desired state")
                });
            }
            ReconcileState::Conflict(reason) => return Err(ControllerError::Conflict(reason)),
            ReconcileState::Changed {
                payload,
                requires_power_off,
            } => (payload, requires_power_off),
        };

        if params.dry_run {
            return Ok(Outcome {
                changed: true,
                vm_uuid: Some(uuid.to_string()),
                msg: Some("VM would be updated".to_string()),
                spec: Some(serde_json::to_value(&payload)?),
                ..Outcome::default()
            });
        }

        let powered_on = observed
            .status
            .as_ref()
            .and_then(|s| s.power_state())
            == Some(PowerState::On);
        if requires_power_off && powered_on {
            self.vm_interim_power_off(uuid, &observed).await?;
            // The interim write advanced both version counters.
            payload.metadata.bump_spec_version();
            payload.metadata.bump_entity_version();
        }

        info!("Updating VM {}", uuid);
        let response = self.client.update_vm(uuid, &payload).await?;
        let (_, task_uuid) = mutation_ids(&response)?;
        self.wait_for_task(&task_uuid).await?;

        Ok(Outcome {
            changed: true,
            msg: Some("VM updated".to_string()),
            vm_uuid: Some(uuid.to_string()),
            task_uuid: Some(task_uuid),
            ..Outcome::default()
        })
    }

    /// Power the VM off ahead of a shrinking resize and wait for the task.
    /// The desired power state in the follow-up update powers it back on.
    async fn vm_interim_power_off(
        &self,
        uuid: &str,
        observed: &VmEntity,
    ) -> Result<(), ControllerError> {
        info!("Powering off VM {} before shrinking its allocation", uuid);
        let mut payload = observed.clone();
        payload.strip_status();
        if let Some(spec) = payload.spec.as_mut() {
            spec.resources.power_state = Some(PowerState::Off);
            spec.resources.power_state_mechanism = Some(PowerStateMechanism::hard());
        }
        payload.metadata.bump_spec_version();

        let response = self.client.update_vm(uuid, &payload).await?;
        let (_, task_uuid) = mutation_ids(&response)?;
        self.wait_for_task(&task_uuid).await?;
        Ok(())
    }

    async fn vm_absent(&self, params: &VmParams) -> Result<Outcome, ControllerError> {
        let Some(uuid) = self.locate_vm(params).await? else {
            return Ok(Outcome::unchanged("VM does not exist, nothing to delete"));
        };

        if params.dry_run {
            return Ok(Outcome {
                changed: true,
                vm_uuid: Some(uuid),
                msg: Some("VM would be deleted".to_string()),
                ..Outcome::default()
            });
        }

        info!("Deleting VM {}", uuid);
        let response = self.client.delete_vm(&uuid).await?;
        let (_, task_uuid) = mutation_ids(&response)?;
        self.wait_for_task(&task_uuid).await?;

        Ok(Outcome {
            changed: true,
            msg: Some("VM deleted".to_string()),
            vm_uuid: Some(uuid),
            task_uuid: Some(task_uuid),
            ..Outcome::default()
        })
    }

    async fn vm_power(
        &self,
        params: &VmParams,
        target: PowerState,
    ) -> Result<Outcome, ControllerError> {
        let uuid = self.locate_vm(params).await?.ok_or_else(|| {
            PrismError::NotFound(format!(
                "Could not find VM '{}'",
                params.name.as_deref().unwrap_or_default()
            ))
        })?;

        let observed = self.client.get_vm(&uuid).await?;
        let current = observed.status.as_ref().and_then(|s| s.power_state());
        if current == Some(target) {
            return Ok(Outcome {
                vm_uuid: Some(uuid),
                ..Outcome::unchanged("VM already in desired power state")
            });
        }

        if params.dry_run {
            return Ok(Outcome {
                changed: true,
                vm_uuid: Some(uuid),
                msg: Some(format!("VM power state would change to {target:?}")),
                ..Outcome::default()
            });
        }

        info!("Changing power state of VM {} to {:?}", uuid, target);
        let mut payload = observed;
        payload.strip_status();
        if let Some(spec) = payload.spec.as_mut() {
            spec.resources.power_state = Some(target);
            spec.resources.power_state_mechanism = Some(PowerStateMechanism::hard());
        }
        payload.metadata.bump_spec_version();

        let response = self.client.update_vm(&uuid, &payload).await?;
        let (_, task_uuid) = mutation_ids(&response)?;
        self.wait_for_task(&task_uuid).await?;

        Ok(Outcome {
            changed: true,
            msg: Some(format!("VM powered {}", power_word(target))),
            vm_uuid: Some(uuid),
            task_uuid: Some(task_uuid),
            ..Outcome::default()
        })
    }
}

fn vm_name(params: &VmParams) -> Result<&str, ControllerError> {
    params
        .name
        .as_deref()
        .ok_or_else(|| ControllerError::InvalidConfig("VM name is required".to_string()))
}

fn power_word(state: PowerState) -> &'static str {
    match state {
        PowerState::On => "on",
        PowerState::Off => "off",
    }
}
