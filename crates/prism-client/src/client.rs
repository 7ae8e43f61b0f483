//! Prism Central API client
//!
//! Implements the v3 REST client. All entity collections share the same
//! endpoint shape (`POST /{kind}/list`, `POST /{kind}`, `PUT /{kind}/{uuid}`,
//! `DELETE /{kind}/{uuid}`), so the typed operations are thin wrappers over a
//! small set of HTTP helpers.

use crate::error::PrismError;
use crate::models::*;
use crate::pagination::{ListRequest, ListResponse};
use crate::prism_trait::PrismApi;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Connection settings for a Prism Central endpoint.
#[derive(Debug, Clone)]
pub struct PrismConfig {
    /// PC hostname or IP address
    pub hostname: String,
    /// PC username
    pub username: String,
    /// PC password
    pub password: String,
    /// PC port, 9440 unless overridden
    pub port: u16,
    /// Verify the server certificate; disable only for self-signed lab setups
    pub validate_certs: bool,
}

/// Prism Central API client owning the pooled HTTP connection.
pub struct PrismClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl std::fmt::Debug for PrismClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrismClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl PrismClient {
    /// Create a new client.
    ///
    /// # Errors
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn new(config: PrismConfig) -> Result<Self, PrismError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .danger_accept_invalid_certs(!config.validate_certs)
            .build()
            .map_err(PrismError::Http)?;

        Ok(Self {
            client,
            base_url: format!(
                "https://{}:{}/api/nutanix/v3",
                config.hostname.trim_end_matches('/'),
                config.port
            ),
            username: config.username,
            password: config.password,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Validate credentials and connectivity with a lightweight list call.
    ///
    /// # Errors
    /// Returns an error when the credentials are rejected or PC is unreachable.
    pub async fn validate_connection(&self) -> Result<(), PrismError> {
        debug!("Validating Prism Central credentials and connectivity");
        let _: ListResponse<ClusterEntity> = self
            .post_json("/clusters/list", &ListRequest::page(None, 0, 1))
            .await?;
        debug!("Prism Central credentials validated");
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, PrismError> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(PrismError::Http)?;

        let status = response.status();
        if status == 404 {
            let body = response.text().await.unwrap_or_default();
            return Err(PrismError::NotFound(format!(
                "Resource not found: {path} - {body}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PrismError::Api(format!(
                "GET {path} failed: {status} - {body}"
            )));
        }

        Self::decode_body(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, PrismError> {
        self.send_with_body(reqwest::Method::POST, path, body).await
    }

    async fn put_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, PrismError> {
        self.send_with_body(reqwest::Method::PUT, path, body).await
    }

    async fn send_with_body<T: DeserializeOwned, B: Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<T, PrismError> {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let response = self
            .client
            .request(method.clone(), &url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(PrismError::Http)?;

        let status = response.status();
        if status == 404 {
            let body_text = response.text().await.unwrap_or_default();
            return Err(PrismError::NotFound(format!(
                "Resource not found: {path} - {body_text}"
            )));
        }
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(PrismError::Api(format!(
                "{method} {path} failed: {status} - {body_text}"
            )));
        }

        Self::decode_body(response).await
    }

    async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, PrismError> {
        let url = self.url(path);
        debug!("DELETE {}", url);

        let response = self
            .client
            .delete(&url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(PrismError::Http)?;

        let status = response.status();
        if status == 404 {
            let body = response.text().await.unwrap_or_default();
            return Err(PrismError::NotFound(format!(
                "Resource not found: {path} - {body}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PrismError::Api(format!(
                "DELETE {path} failed: {status} - {body}"
            )));
        }

        Self::decode_body(response).await
    }

    // Decode via text so a malformed body surfaces with its leading content
    // instead of an opaque reqwest decode error.
    async fn decode_body<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, PrismError> {
        let response_text = response.text().await.map_err(PrismError::Http)?;
        serde_json::from_str(&response_text).map_err(|e| {
            PrismError::Api(format!(
                "error decoding response body: {} - Response (first 500 chars): {}",
                e,
                response_text.chars().take(500).collect::<String>()
            ))
        })
    }
}

#[async_trait::async_trait]
impl PrismApi for PrismClient {
    async fn list_vms(&self, req: ListRequest) -> Result<ListResponse<VmEntity>, PrismError> {
        self.post_json("/vms/list", &req).await
    }

    async fn get_vm(&self, uuid: &str) -> Result<VmEntity, PrismError> {
        self.get_json(&format!("/vms/{uuid}")).await
    }

    async fn create_vm(&self, payload: &VmEntity) -> Result<MutationResponse, PrismError> {
        self.post_json("/vms", payload).await
    }

    async fn update_vm(
        &self,
        uuid: &str,
        payload: &VmEntity,
    ) -> Result<MutationResponse, PrismError> {
        self.put_json(&format!("/vms/{uuid}"), payload).await
    }

    async fn delete_vm(&self, uuid: &str) -> Result<MutationResponse, PrismError> {
        self.delete_json(&format!("/vms/{uuid}")).await
    }

    async fn list_subnets(
        &self,
        req: ListRequest,
    ) -> Result<ListResponse<SubnetEntity>, PrismError> {
        self.post_json("/subnets/list", &req).await
    }

    async fn get_subnet(&self, uuid: &str) -> Result<SubnetEntity, PrismError> {
        self.get_json(&format!("/subnets/{uuid}")).await
    }

    async fn create_subnet(&self, payload: &SubnetEntity) -> Result<MutationResponse, PrismError> {
        self.post_json("/subnets", payload).await
    }

    async fn update_subnet(
        &self,
        uuid: &str,
        payload: &SubnetEntity,
    ) -> Result<MutationResponse, PrismError> {
        self.put_json(&format!("/subnets/{uuid}"), payload).await
    }

    async fn delete_subnet(&self, uuid: &str) -> Result<MutationResponse, PrismError> {
        self.delete_json(&format!("/subnets/{uuid}")).await
    }

    async fn list_images(
        &self,
        req: ListRequest,
    ) -> Result<ListResponse<ImageEntity>, PrismError> {
        self.post_json("/images/list", &req).await
    }

    async fn get_image(&self, uuid: &str) -> Result<ImageEntity, PrismError> {
        self.get_json(&format!("/images/{uuid}")).await
    }

    async fn create_image(&self, payload: &ImageEntity) -> Result<MutationResponse, PrismError> {
        self.post_json("/images", payload).await
    }

    async fn update_image(
        &self,
        uuid: &str,
        payload: &ImageEntity,
    ) -> Result<MutationResponse, PrismError> {
        self.put_json(&format!("/images/{uuid}"), payload).await
    }

    async fn delete_image(&self, uuid: &str) -> Result<MutationResponse, PrismError> {
        self.delete_json(&format!("/images/{uuid}")).await
    }

    async fn list_clusters(
        &self,
        req: ListRequest,
    ) -> Result<ListResponse<ClusterEntity>, PrismError> {
        self.post_json("/clusters/list", &req).await
    }

    async fn group_query(&self, req: &GroupsRequest) -> Result<GroupsResponse, PrismError> {
        self.post_json("/groups", req).await
    }

    async fn get_task(&self, uuid: &str) -> Result<Task, PrismError> {
        self.get_json(&format!("/tasks/{uuid}")).await
    }
}
