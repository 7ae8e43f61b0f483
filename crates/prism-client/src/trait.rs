//! PrismApi trait for mocking
//!
//! This trait abstracts the concrete client so reconcilers can be unit tested
//! against an in-memory mock. All async methods must be `Send` to work with
//! Tokio's work-stealing runtime.

use crate::error::PrismError;
use crate::models::*;
use crate::pagination::{ListRequest, ListResponse};

/// Operations the reconcilers issue against Prism Central.
#[async_trait::async_trait]
pub trait PrismApi: Send + Sync {
    // VM operations
    /// List one page of VMs.
    async fn list_vms(&self, req: ListRequest) -> Result<ListResponse<VmEntity>, PrismError>;
    /// Fetch one VM by UUID.
    async fn get_vm(&self, uuid: &str) -> Result<VmEntity, PrismError>;
    /// Create a VM from an intent spec.
    async fn create_vm(&self, payload: &VmEntity) -> Result<MutationResponse, PrismError>;
    /// Replace a VM's intent spec.
    async fn update_vm(
        &self,
        uuid: &str,
        payload: &VmEntity,
    ) -> Result<MutationResponse, PrismError>;
    /// Delete a VM by UUID.
    async fn delete_vm(&self, uuid: &str) -> Result<MutationResponse, PrismError>;

    // Subnet operations
    /// List one page of subnets.
    async fn list_subnets(
        &self,
        req: ListRequest,
    ) -> Result<ListResponse<SubnetEntity>, PrismError>;
    /// Fetch one subnet by UUID.
    async fn get_subnet(&self, uuid: &str) -> Result<SubnetEntity, PrismError>;
    /// Create a subnet from an intent spec.
    async fn create_subnet(&self, payload: &SubnetEntity) -> Result<MutationResponse, PrismError>;
    /// Replace a subnet's intent spec.
    async fn update_subnet(
        &self,
        uuid: &str,
        payload: &SubnetEntity,
    ) -> Result<MutationResponse, PrismError>;
    /// Delete a subnet by UUID.
    async fn delete_subnet(&self, uuid: &str) -> Result<MutationResponse, PrismError>;

    // Image operations
    /// List one page of images.
    async fn list_images(&self, req: ListRequest)
        -> Result<ListResponse<ImageEntity>, PrismError>;
    /// Fetch one image by UUID.
    async fn get_image(&self, uuid: &str) -> Result<ImageEntity, PrismError>;
    /// Create an image from an intent spec.
    async fn create_image(&self, payload: &ImageEntity) -> Result<MutationResponse, PrismError>;
    /// Replace an image's intent spec.
    async fn update_image(
        &self,
        uuid: &str,
        payload: &ImageEntity,
    ) -> Result<MutationResponse, PrismError>;
    /// Delete an image by UUID.
    async fn delete_image(&self, uuid: &str) -> Result<MutationResponse, PrismError>;

    // Cluster operations
    /// List one page of clusters.
    async fn list_clusters(
        &self,
        req: ListRequest,
    ) -> Result<ListResponse<ClusterEntity>, PrismError>;

    // Cross-referencing
    /// Run a grouped-aggregation query against `/groups`.
    async fn group_query(&self, req: &GroupsRequest) -> Result<GroupsResponse, PrismError>;

    // Tasks
    /// Fetch the current state of an asynchronous task.
    async fn get_task(&self, uuid: &str) -> Result<Task, PrismError>;
}
