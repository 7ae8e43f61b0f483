//! Image reconciler

use super::{Outcome, Reconciler, mutation_ids};
use crate::builder;
use crate::diff::{ReconcileState, diff_image};
use crate::error::ControllerError;
use crate::params::{ImageParams, State};
use prism_client::{EntityKind, PrismError, resolve};
use tracing::{debug, info, warn};

impl Reconciler {
    /// Reconcile one declared image operation.
    ///
    /// # Errors
    /// Resolution, configuration, conflict, API and task failures.
    pub async fn reconcile_image(&self, params: &ImageParams) -> Result<Outcome, ControllerError> {
        match params.state {
            State::Present => self.image_present(params).await,
            State::Absent => self.image_absent(params).await,
            State::Poweron | State::Poweroff => Err(ControllerError::InvalidConfig(
                "images have no power state".to_string(),
            )),
        }
    }

    async fn image_present(&self, params: &ImageParams) -> Result<Outcome, ControllerError> {
        if let Some(uuid) = &params.image_uuid {
            return self.image_update(params, uuid).await;
        }

        let name = image_name(params)?;
        let uuids =
            resolve::find_uuids_by_name(self.client.as_ref(), EntityKind::Image, name).await?;
        match uuids.as_slice() {
            [] => self.image_create(params).await,
            [uuid] => self.image_update(params, uuid).await,
            _ if params.force => {
                // Force opts into duplicate names: create another image.
                warn!(
                    "{} images named '{}' already exist, creating another (force)",
                    uuids.len(),
                    name
                );
                self.image_create(params).await
            }
            _ => Err(PrismError::AmbiguousName {
                kind: "image".to_string(),
                name: name.to_string(),
                uuids,
            }
            .into()),
        }
    }

    async fn image_create(&self, params: &ImageParams) -> Result<Outcome, ControllerError> {
        let name = image_name(params)?;
        let payload = builder::build_image_payload(params)?;

        if params.dry_run {
            return Ok(Outcome {
                changed: true,
                msg: Some(format!("Image '{name}' would be created")),
                spec: Some(serde_json::to_value(&payload)?),
                ..Outcome::default()
            });
        }

        info!("Creating image '{}'", name);
        let response = self.client.create_image(&payload).await?;
        let (image_uuid, task_uuid) = mutation_ids(&response)?;
        self.wait_for_task(&task_uuid).await?;

        info!("Created image '{}' ({:?})", name, image_uuid);
        Ok(Outcome {
            changed: true,
            msg: Some(format!("Image '{name}' created")),
            image_uuid,
            task_uuid: Some(task_uuid),
            ..Outcome::default()
        })
    }

    async fn image_update(
        &self,
        params: &ImageParams,
        uuid: &str,
    ) -> Result<Outcome, ControllerError> {
        let observed = self.client.get_image(uuid).await?;

        let payload = match diff_image(
            &observed,
            params.source_uri.as_deref(),
            params.new_image_name.as_deref(),
            params.new_image_type.as_deref(),
        ) {
            ReconcileState::Unchanged => {
                debug!("Image {} already matches the declared state", uuid);
                return Ok(Outcome {
                    image_uuid: Some(uuid.to_string()),
                    ..Outcome::unchanged("Image already in desired state")
                });
            }
            ReconcileState::Conflict(reason) => return Err(ControllerError::Conflict(reason)),
            ReconcileState::Changed { payload, .. } => payload,
        };

        if params.dry_run {
            return Ok(Outcome {
                changed: true,
                image_uuid: Some(uuid.to_string()),
                msg: Some("Image would be updated".to_string()),
                spec: Some(serde_json::to_value(&payload)?),
                ..Outcome::default()
            });
        }

        info!("Updating image {}", uuid);
        let response = self.client.update_image(uuid, &payload).await?;
        let (_, task_uuid) = mutation_ids(&response)?;
        self.wait_for_task(&task_uuid).await?;

        Ok(Outcome {
            changed: true,
            msg: Some("Image updated".to_string()),
            image_uuid: Some(uuid.to_string()),
            task_uuid: Some(task_uuid),
            ..Outcome::default()
        })
    }

    async fn image_absent(&self, params: &ImageParams) -> Result<Outcome, ControllerError> {
        if let Some(uuid) = &params.image_uuid {
            return self.image_delete_one(uuid, params.dry_run).await;
        }

        let name = image_name(params)?;
        let uuids =
            resolve::find_uuids_by_name(self.client.as_ref(), EntityKind::Image, name).await?;
        match uuids.as_slice() {
            [] => Ok(Outcome::unchanged(format!(
                "Image '{name}' does not exist, nothing to delete"
            ))),
            [uuid] => self.image_delete_one(uuid, params.dry_run).await,
            _ if params.force => self.image_delete_all(name, &uuids, params.dry_run).await,
            _ => Err(PrismError::AmbiguousName {
                kind: "image".to_string(),
                name: name.to_string(),
                uuids,
            }
            .into()),
        }
    }

    async fn image_delete_one(
        &self,
        uuid: &str,
        dry_run: bool,
    ) -> Result<Outcome, ControllerError> {
        if dry_run {
            return Ok(Outcome {
                changed: true,
                image_uuid: Some(uuid.to_string()),
                msg: Some("Image would be deleted".to_string()),
                ..Outcome::default()
            });
        }

        info!("Deleting image {}", uuid);
        let response = self.client.delete_image(uuid).await?;
        let (_, task_uuid) = mutation_ids(&response)?;
        self.wait_for_task(&task_uuid).await?;

        Ok(Outcome {
            changed: true,
            msg: Some("Image deleted".to_string()),
            image_uuid: Some(uuid.to_string()),
            task_uuid: Some(task_uuid),
            ..Outcome::default()
        })
    }

    /// Delete every duplicate of a forced absent operation, polling each
    /// task sequentially and aggregating per-image failures.
    async fn image_delete_all(
        &self,
        name: &str,
        uuids: &[String],
        dry_run: bool,
    ) -> Result<Outcome, ControllerError> {
        if dry_run {
            return Ok(Outcome {
                changed: true,
                msg: Some(format!(
                    "{} images named '{name}' would be deleted",
                    uuids.len()
                )),
                ..Outcome::default()
            });
        }

        let mut failures = Vec::new();
        let mut last_task = None;
        for uuid in uuids {
            info!("Deleting image {} ('{}')", uuid, name);
            let deleted = async {
                let response = self.client.delete_image(uuid).await?;
                let (_, task_uuid) = mutation_ids(&response)?;
                self.wait_for_task(&task_uuid).await?;
                Ok::<String, ControllerError>(task_uuid)
            }
            .await;
            match deleted {
                Ok(task_uuid) => last_task = Some(task_uuid),
                Err(e) => failures.push(format!("{uuid}: {e}")),
            }
        }

        if !failures.is_empty() {
            return Err(PrismError::Api(format!(
                "failed deleting {} of {} images named '{name}': {}",
                failures.len(),
                uuids.len(),
                failures.join("; ")
            ))
            .into());
        }

        Ok(Outcome {
            changed: true,
            msg: Some(format!("{} images named '{name}' deleted", uuids.len())),
            task_uuid: last_task,
            ..Outcome::default()
        })
    }
}

fn image_name(params: &ImageParams) -> Result<&str, ControllerError> {
    params
        .name
        .as_deref()
        .ok_or_else(|| ControllerError::InvalidConfig("image name is required".to_string()))
}
