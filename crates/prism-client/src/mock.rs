//! Mock Prism client for unit testing
//!
//! In-memory implementation of [`PrismApi`] so reconcilers can be tested
//! without a running Prism Central. Resources live in shared hash maps, task
//! status sequences can be scripted per task UUID, and every API call is
//! recorded in a journal so tests can assert call counts and ordering.

use crate::error::PrismError;
use crate::models::*;
use crate::pagination::{ListMetadata, ListRequest, ListResponse};
use crate::prism_trait::PrismApi;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Mock Prism client for testing.
#[derive(Clone, Default)]
pub struct MockPrismClient {
    vms: Arc<Mutex<HashMap<String, VmEntity>>>,
    subnets: Arc<Mutex<HashMap<String, SubnetEntity>>>,
    images: Arc<Mutex<HashMap<String, ImageEntity>>>,
    clusters: Arc<Mutex<HashMap<String, ClusterEntity>>>,
    // (cluster_uuid, name) -> resource uuid
    virtual_switches: Arc<Mutex<HashMap<(String, String), String>>>,
    storage_containers: Arc<Mutex<HashMap<(String, String), String>>>,
    // Scripted task sequences; the last element is sticky.
    tasks: Arc<Mutex<HashMap<String, VecDeque<Task>>>>,
    // Scripted poll failures, drained before the task sequence is consulted.
    task_poll_errors: Arc<Mutex<HashMap<String, VecDeque<String>>>>,
    // Ordered record of every API call, e.g. "PUT /vms/u-1".
    journal: Arc<Mutex<Vec<String>>>,
    // Payload history of VM updates, for ordering assertions.
    vm_updates: Arc<Mutex<Vec<(String, VmEntity)>>>,
    next_id: Arc<Mutex<u64>>,
}

impl std::fmt::Debug for MockPrismClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPrismClient").finish_non_exhaustive()
    }
}

impl MockPrismClient {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, entry: impl Into<String>) {
        self.journal.lock().unwrap().push(entry.into());
    }

    fn next_id(&self) -> u64 {
        let mut id = self.next_id.lock().unwrap();
        *id += 1;
        *id
    }

    /// Every API call issued so far, in order.
    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    /// Number of journal entries starting with the given prefix.
    pub fn calls_matching(&self, prefix: &str) -> usize {
        self.journal
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    /// Number of times the given task has been polled.
    pub fn task_poll_count(&self, task_uuid: &str) -> usize {
        self.calls_matching(&format!("GET /tasks/{task_uuid}"))
    }

    /// Payload history of VM updates, oldest first.
    pub fn vm_update_history(&self) -> Vec<(String, VmEntity)> {
        self.vm_updates.lock().unwrap().clone()
    }

    /// Seed a VM (test setup).
    pub fn add_vm(&self, vm: VmEntity) {
        let uuid = vm.metadata.uuid.clone().unwrap_or_default();
        self.vms.lock().unwrap().insert(uuid, vm);
    }

    /// Seed a subnet (test setup).
    pub fn add_subnet(&self, subnet: SubnetEntity) {
        let uuid = subnet.metadata.uuid.clone().unwrap_or_default();
        self.subnets.lock().unwrap().insert(uuid, subnet);
    }

    /// Seed an image (test setup).
    pub fn add_image(&self, image: ImageEntity) {
        let uuid = image.metadata.uuid.clone().unwrap_or_default();
        self.images.lock().unwrap().insert(uuid, image);
    }

    /// Seed a cluster (test setup).
    pub fn add_cluster(&self, uuid: &str, name: &str) {
        let cluster = ClusterEntity {
            api_version: None,
            metadata: Metadata {
                kind: "cluster".to_string(),
                uuid: Some(uuid.to_string()),
                name: None,
                spec_version: None,
                entity_version: None,
                extra: serde_json::Map::new(),
            },
            spec: None,
            status: Some(EntityStatus {
                name: Some(name.to_string()),
                ..EntityStatus::default()
            }),
        };
        self.clusters.lock().unwrap().insert(uuid.to_string(), cluster);
    }

    /// Seed a virtual switch on a cluster (test setup).
    pub fn add_virtual_switch(&self, cluster_uuid: &str, name: &str, uuid: &str) {
        self.virtual_switches.lock().unwrap().insert(
            (cluster_uuid.to_string(), name.to_string()),
            uuid.to_string(),
        );
    }

    /// Seed a storage container on a cluster (test setup).
    pub fn add_storage_container(&self, cluster_uuid: &str, name: &str, uuid: &str) {
        self.storage_containers.lock().unwrap().insert(
            (cluster_uuid.to_string(), name.to_string()),
            uuid.to_string(),
        );
    }

    /// Script the status sequence a task runs through; the last entry is
    /// sticky once the sequence is drained.
    pub fn script_task(&self, task_uuid: &str, statuses: Vec<TaskStatus>) {
        let tasks = statuses
            .into_iter()
            .map(|status| Task {
                uuid: Some(task_uuid.to_string()),
                status,
                error_detail: None,
                percentage_complete: None,
            })
            .collect();
        self.tasks.lock().unwrap().insert(task_uuid.to_string(), tasks);
    }

    /// Script the next `count` polls of a task to fail with an API error
    /// before the task sequence is consulted.
    pub fn fail_task_polls(&self, task_uuid: &str, count: usize, message: &str) {
        let mut errors = self.task_poll_errors.lock().unwrap();
        let queue = errors.entry(task_uuid.to_string()).or_default();
        for _ in 0..count {
            queue.push_back(message.to_string());
        }
    }

    /// Script a task sequence whose FAILED entries carry the given detail.
    pub fn script_task_with_detail(
        &self,
        task_uuid: &str,
        statuses: Vec<TaskStatus>,
        detail: &str,
    ) {
        let tasks = statuses
            .into_iter()
            .map(|status| Task {
                uuid: Some(task_uuid.to_string()),
                status,
                error_detail: (status == TaskStatus::Failed).then(|| detail.to_string()),
                percentage_complete: None,
            })
            .collect();
        self.tasks.lock().unwrap().insert(task_uuid.to_string(), tasks);
    }

    /// Minimal VM fixture carrying a UUID and a reported name.
    pub fn vm_fixture(uuid: &str, name: &str) -> VmEntity {
        VmEntity {
            api_version: Some("3.1.0".to_string()),
            metadata: Metadata {
                kind: "vm".to_string(),
                uuid: Some(uuid.to_string()),
                name: None,
                spec_version: Some(1),
                entity_version: Some("1".to_string()),
                extra: serde_json::Map::new(),
            },
            spec: Some(VmSpec {
                name: name.to_string(),
                cluster_reference: None,
                resources: VmResources::default(),
                extra: serde_json::Map::new(),
            }),
            status: Some(VmStatus {
                name: Some(name.to_string()),
                state: Some("COMPLETE".to_string()),
                ..VmStatus::default()
            }),
        }
    }

    /// Minimal subnet fixture carrying a UUID and a reported name.
    pub fn subnet_fixture(uuid: &str, name: &str) -> SubnetEntity {
        SubnetEntity {
            api_version: Some("3.1.0".to_string()),
            metadata: Metadata {
                kind: "subnet".to_string(),
                uuid: Some(uuid.to_string()),
                name: None,
                spec_version: Some(1),
                entity_version: Some("1".to_string()),
                extra: serde_json::Map::new(),
            },
            spec: Some(SubnetSpec {
                name: name.to_string(),
                cluster_reference: None,
                resources: SubnetResources::default(),
                extra: serde_json::Map::new(),
            }),
            status: Some(EntityStatus {
                name: Some(name.to_string()),
                state: Some("COMPLETE".to_string()),
                ..EntityStatus::default()
            }),
        }
    }

    /// Minimal image fixture carrying a UUID and a reported name.
    pub fn image_fixture(uuid: &str, name: &str) -> ImageEntity {
        ImageEntity {
            api_version: Some("3.1.0".to_string()),
            metadata: Metadata {
                kind: "image".to_string(),
                uuid: Some(uuid.to_string()),
                name: Some(name.to_string()),
                spec_version: Some(1),
                entity_version: Some("1".to_string()),
                extra: serde_json::Map::new(),
            },
            spec: Some(ImageSpec {
                name: name.to_string(),
                description: None,
                resources: ImageResources::default(),
                extra: serde_json::Map::new(),
            }),
            status: Some(EntityStatus {
                name: Some(name.to_string()),
                state: Some("COMPLETE".to_string()),
                ..EntityStatus::default()
            }),
        }
    }

    // Mutations auto-register an immediately-SUCCEEDED task unless the test
    // scripted one under the returned UUID beforehand.
    fn register_task(&self) -> String {
        let task_uuid = format!("task-{}", self.next_id());
        let mut tasks = self.tasks.lock().unwrap();
        tasks.entry(task_uuid.clone()).or_insert_with(|| {
            VecDeque::from(vec![Task {
                uuid: Some(task_uuid.clone()),
                status: TaskStatus::Succeeded,
                error_detail: None,
                percentage_complete: None,
            }])
        });
        task_uuid
    }

    fn mutation_response(entity_uuid: Option<String>, kind: &str, task_uuid: String) -> MutationResponse {
        MutationResponse {
            metadata: entity_uuid.map(|uuid| Metadata {
                kind: kind.to_string(),
                uuid: Some(uuid),
                name: None,
                spec_version: None,
                entity_version: None,
                extra: serde_json::Map::new(),
            }),
            status: Some(EntityStatus {
                execution_context: Some(ExecutionContext {
                    task_uuid: Some(task_uuid),
                }),
                ..EntityStatus::default()
            }),
        }
    }

    // FIQL equality filters of the form "attr==value"; anything else matches
    // everything, like an absent filter would.
    fn filter_value(filter: Option<&str>) -> Option<&str> {
        filter.and_then(|f| f.split_once("==")).map(|(_, v)| v)
    }

    fn page_slice<T: Clone>(matches: Vec<T>, req: &ListRequest) -> ListResponse<T> {
        let total = matches.len() as i64;
        let start = usize::try_from(req.offset.max(0)).unwrap_or(usize::MAX);
        let entities: Vec<T> = matches
            .into_iter()
            .skip(start)
            .take(usize::try_from(req.length.max(0)).unwrap_or(0))
            .collect();
        ListResponse {
            entities,
            metadata: ListMetadata {
                total_matches: total,
                offset: Some(req.offset),
                length: Some(req.length),
            },
        }
    }
}

#[async_trait::async_trait]
impl PrismApi for MockPrismClient {
    async fn list_vms(&self, req: ListRequest) -> Result<ListResponse<VmEntity>, PrismError> {
        self.record("POST /vms/list");
        let wanted = Self::filter_value(req.filter.as_deref()).map(String::from);
        let mut matches: Vec<VmEntity> = self
            .vms
            .lock()
            .unwrap()
            .values()
            .filter(|vm| {
                wanted.as_deref().is_none_or(|name| {
                    vm.status.as_ref().and_then(|s| s.name.as_deref()) == Some(name)
                })
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.metadata.uuid.cmp(&b.metadata.uuid));
        Ok(Self::page_slice(matches, &req))
    }

    async fn get_vm(&self, uuid: &str) -> Result<VmEntity, PrismError> {
        self.record(format!("GET /vms/{uuid}"));
        self.vms
            .lock()
            .unwrap()
            .get(uuid)
            .cloned()
            .ok_or_else(|| PrismError::NotFound(format!("VM {uuid} not found")))
    }

    async fn create_vm(&self, payload: &VmEntity) -> Result<MutationResponse, PrismError> {
        self.record("POST /vms");
        let uuid = format!("vm-{}", self.next_id());
        let mut stored = payload.clone();
        stored.metadata.uuid = Some(uuid.clone());
        stored.status = Some(VmStatus {
            name: stored.spec.as_ref().map(|s| s.name.clone()),
            state: Some("COMPLETE".to_string()),
            resources: stored.spec.as_ref().map(|s| s.resources.clone()),
            cluster_reference: stored.spec.as_ref().and_then(|s| s.cluster_reference.clone()),
            execution_context: None,
            extra: serde_json::Map::new(),
        });
        self.vms.lock().unwrap().insert(uuid.clone(), stored);
        let task_uuid = self.register_task();
        Ok(Self::mutation_response(Some(uuid), "vm", task_uuid))
    }

    async fn update_vm(
        &self,
        uuid: &str,
        payload: &VmEntity,
    ) -> Result<MutationResponse, PrismError> {
        self.record(format!("PUT /vms/{uuid}"));
        let mut vms = self.vms.lock().unwrap();
        let existing = vms
            .get_mut(uuid)
            .ok_or_else(|| PrismError::NotFound(format!("VM {uuid} not found")))?;
        let mut stored = payload.clone();
        stored.metadata.uuid = Some(uuid.to_string());
        stored.status = Some(VmStatus {
            name: stored.spec.as_ref().map(|s| s.name.clone()),
            state: Some("COMPLETE".to_string()),
            resources: stored.spec.as_ref().map(|s| s.resources.clone()),
            cluster_reference: stored.spec.as_ref().and_then(|s| s.cluster_reference.clone()),
            execution_context: None,
            extra: serde_json::Map::new(),
        });
        *existing = stored;
        drop(vms);
        self.vm_updates
            .lock()
            .unwrap()
            .push((uuid.to_string(), payload.clone()));
        let task_uuid = self.register_task();
        Ok(Self::mutation_response(Some(uuid.to_string()), "vm", task_uuid))
    }

    async fn delete_vm(&self, uuid: &str) -> Result<MutationResponse, PrismError> {
        self.record(format!("DELETE /vms/{uuid}"));
        self.vms
            .lock()
            .unwrap()
            .remove(uuid)
            .ok_or_else(|| PrismError::NotFound(format!("VM {uuid} not found")))?;
        let task_uuid = self.register_task();
        Ok(Self::mutation_response(Some(uuid.to_string()), "vm", task_uuid))
    }

    async fn list_subnets(
        &self,
        req: ListRequest,
    ) -> Result<ListResponse<SubnetEntity>, PrismError> {
        self.record("POST /subnets/list");
        let wanted = Self::filter_value(req.filter.as_deref()).map(String::from);
        let mut matches: Vec<SubnetEntity> = self
            .subnets
            .lock()
            .unwrap()
            .values()
            .filter(|subnet| {
                wanted.as_deref().is_none_or(|name| {
                    subnet.status.as_ref().and_then(|s| s.name.as_deref()) == Some(name)
                })
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.metadata.uuid.cmp(&b.metadata.uuid));
        Ok(Self::page_slice(matches, &req))
    }

    async fn get_subnet(&self, uuid: &str) -> Result<SubnetEntity, PrismError> {
        self.record(format!("GET /subnets/{uuid}"));
        self.subnets
            .lock()
            .unwrap()
            .get(uuid)
            .cloned()
            .ok_or_else(|| PrismError::NotFound(format!("Subnet {uuid} not found")))
    }

    async fn create_subnet(&self, payload: &SubnetEntity) -> Result<MutationResponse, PrismError> {
        self.record("POST /subnets");
        let uuid = format!("subnet-{}", self.next_id());
        let mut stored = payload.clone();
        stored.metadata.uuid = Some(uuid.clone());
        stored.status = Some(EntityStatus {
            name: stored.spec.as_ref().map(|s| s.name.clone()),
            state: Some("COMPLETE".to_string()),
            ..EntityStatus::default()
        });
        self.subnets.lock().unwrap().insert(uuid.clone(), stored);
        let task_uuid = self.register_task();
        Ok(Self::mutation_response(Some(uuid), "subnet", task_uuid))
    }

    async fn update_subnet(
        &self,
        uuid: &str,
        payload: &SubnetEntity,
    ) -> Result<MutationResponse, PrismError> {
        self.record(format!("PUT /subnets/{uuid}"));
        let mut subnets = self.subnets.lock().unwrap();
        let existing = subnets
            .get_mut(uuid)
            .ok_or_else(|| PrismError::NotFound(format!("Subnet {uuid} not found")))?;
        let mut stored = payload.clone();
        stored.metadata.uuid = Some(uuid.to_string());
        stored.status = Some(EntityStatus {
            name: stored.spec.as_ref().map(|s| s.name.clone()),
            state: Some("COMPLETE".to_string()),
            ..EntityStatus::default()
        });
        *existing = stored;
        drop(subnets);
        let task_uuid = self.register_task();
        Ok(Self::mutation_response(
            Some(uuid.to_string()),
            "subnet",
            task_uuid,
        ))
    }

    async fn delete_subnet(&self, uuid: &str) -> Result<MutationResponse, PrismError> {
        self.record(format!("DELETE /subnets/{uuid}"));
        self.subnets
            .lock()
            .unwrap()
            .remove(uuid)
            .ok_or_else(|| PrismError::NotFound(format!("Subnet {uuid} not found")))?;
        let task_uuid = self.register_task();
        Ok(Self::mutation_response(
            Some(uuid.to_string()),
            "subnet",
            task_uuid,
        ))
    }

    async fn list_images(
        &self,
        req: ListRequest,
    ) -> Result<ListResponse<ImageEntity>, PrismError> {
        self.record("POST /images/list");
        let wanted = Self::filter_value(req.filter.as_deref()).map(String::from);
        let mut matches: Vec<ImageEntity> = self
            .images
            .lock()
            .unwrap()
            .values()
            .filter(|image| {
                wanted.as_deref().is_none_or(|name| {
                    image.status.as_ref().and_then(|s| s.name.as_deref()) == Some(name)
                })
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.metadata.uuid.cmp(&b.metadata.uuid));
        Ok(Self::page_slice(matches, &req))
    }

    async fn get_image(&self, uuid: &str) -> Result<ImageEntity, PrismError> {
        self.record(format!("GET /images/{uuid}"));
        self.images
            .lock()
            .unwrap()
            .get(uuid)
            .cloned()
            .ok_or_else(|| PrismError::NotFound(format!("Image {uuid} not found")))
    }

    async fn create_image(&self, payload: &ImageEntity) -> Result<MutationResponse, PrismError> {
        self.record("POST /images");
        let uuid = format!("image-{}", self.next_id());
        let mut stored = payload.clone();
        stored.metadata.uuid = Some(uuid.clone());
        stored.status = Some(EntityStatus {
            name: stored.spec.as_ref().map(|s| s.name.clone()),
            state: Some("COMPLETE".to_string()),
            ..EntityStatus::default()
        });
        self.images.lock().unwrap().insert(uuid.clone(), stored);
        let task_uuid = self.register_task();
        Ok(Self::mutation_response(Some(uuid), "image", task_uuid))
    }

    async fn update_image(
        &self,
        uuid: &str,
        payload: &ImageEntity,
    ) -> Result<MutationResponse, PrismError> {
        self.record(format!("PUT /images/{uuid}"));
        let mut images = self.images.lock().unwrap();
        let existing = images
            .get_mut(uuid)
            .ok_or_else(|| PrismError::NotFound(format!("Image {uuid} not found")))?;
        let mut stored = payload.clone();
        stored.metadata.uuid = Some(uuid.to_string());
        stored.status = Some(EntityStatus {
            name: stored.spec.as_ref().map(|s| s.name.clone()),
            state: Some("COMPLETE".to_string()),
            ..EntityStatus::default()
        });
        *existing = stored;
        drop(images);
        let task_uuid = self.register_task();
        Ok(Self::mutation_response(
            Some(uuid.to_string()),
            "image",
            task_uuid,
        ))
    }

    async fn delete_image(&self, uuid: &str) -> Result<MutationResponse, PrismError> {
        self.record(format!("DELETE /images/{uuid}"));
        self.images
            .lock()
            .unwrap()
            .remove(uuid)
            .ok_or_else(|| PrismError::NotFound(format!("Image {uuid} not found")))?;
        let task_uuid = self.register_task();
        Ok(Self::mutation_response(
            Some(uuid.to_string()),
            "image",
            task_uuid,
        ))
    }

    async fn list_clusters(
        &self,
        req: ListRequest,
    ) -> Result<ListResponse<ClusterEntity>, PrismError> {
        self.record("POST /clusters/list");
        let wanted = Self::filter_value(req.filter.as_deref()).map(String::from);
        let mut matches: Vec<ClusterEntity> = self
            .clusters
            .lock()
            .unwrap()
            .values()
            .filter(|cluster| {
                wanted.as_deref().is_none_or(|name| {
                    cluster.status.as_ref().and_then(|s| s.name.as_deref()) == Some(name)
                })
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.metadata.uuid.cmp(&b.metadata.uuid));
        Ok(Self::page_slice(matches, &req))
    }

    async fn group_query(&self, req: &GroupsRequest) -> Result<GroupsResponse, PrismError> {
        self.record(format!("POST /groups {}", req.entity_type));
        let (store, name_attribute, cluster_attribute) = match req.entity_type.as_str() {
            "distributed_virtual_switch" => (
                &self.virtual_switches,
                "name",
                "cluster_configuration_list.cluster_uuid",
            ),
            "storage_container" => (&self.storage_containers, "container_name", "cluster"),
            other => {
                return Err(PrismError::InvalidRequest(format!(
                    "unsupported groups entity_type '{other}'"
                )));
            }
        };
        let wanted = Self::filter_value(req.filter_criteria.as_deref()).map(String::from);

        let entity_results = store
            .lock()
            .unwrap()
            .iter()
            .filter(|((_, name), _)| wanted.as_deref().is_none_or(|w| w == name.as_str()))
            .map(|((cluster_uuid, name), uuid)| GroupEntityResult {
                entity_id: uuid.clone(),
                data: vec![
                    GroupFieldData {
                        name: name_attribute.to_string(),
                        values: vec![GroupFieldValues {
                            values: vec![name.clone()],
                        }],
                    },
                    GroupFieldData {
                        name: cluster_attribute.to_string(),
                        values: vec![GroupFieldValues {
                            values: vec![cluster_uuid.clone()],
                        }],
                    },
                ],
            })
            .collect();

        Ok(GroupsResponse {
            group_results: vec![GroupResult { entity_results }],
        })
    }

    async fn get_task(&self, uuid: &str) -> Result<Task, PrismError> {
        self.record(format!("GET /tasks/{uuid}"));
        if let Some(message) = self
            .task_poll_errors
            .lock()
            .unwrap()
            .get_mut(uuid)
            .and_then(VecDeque::pop_front)
        {
            return Err(PrismError::Api(message));
        }
        let mut tasks = self.tasks.lock().unwrap();
        match tasks.get_mut(uuid) {
            Some(sequence) if sequence.len() > 1 => sequence
                .pop_front()
                .ok_or_else(|| PrismError::NotFound(format!("Task {uuid} not found"))),
            Some(sequence) => sequence
                .front()
                .cloned()
                .ok_or_else(|| PrismError::NotFound(format!("Task {uuid} not found"))),
            None => Err(PrismError::NotFound(format!("Task {uuid} not found"))),
        }
    }
}
