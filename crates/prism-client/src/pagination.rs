//! Cursor-based pagination over v3 list endpoints
//!
//! Every collection endpoint takes `{filter, length, offset}` and answers with
//! `{entities[], metadata: {total_matches}}`. The drain loop keeps fetching
//! consecutive pages until `offset >= total_matches`; `total_matches` is only
//! authoritative after the first page, so it starts at a sentinel above zero.

use crate::error::PrismError;
use crate::models::{ClusterEntity, ImageEntity, SubnetEntity, VmEntity};
use crate::prism_trait::PrismApi;
use serde::{Deserialize, Serialize};

/// Body of a `POST /{kind}/list` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListRequest {
    /// FIQL filter, e.g. `vm_name==vm1`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Page length
    pub length: i64,
    /// Page offset
    pub offset: i64,
    /// Attribute to sort by
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_attribute: Option<String>,
    /// `ASCENDING` or `DESCENDING`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<String>,
}

impl ListRequest {
    /// One page of the given length at the given offset.
    pub fn page(filter: Option<String>, offset: i64, length: i64) -> Self {
        Self {
            filter,
            length,
            offset,
            sort_attribute: None,
            sort_order: None,
        }
    }
}

impl Default for ListRequest {
    fn default() -> Self {
        Self::page(None, 0, 100)
    }
}

/// Pagination metadata echoed on every list response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListMetadata {
    /// Total entities matching the filter across all pages
    #[serde(default)]
    pub total_matches: i64,
    /// Offset this page was fetched at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    /// Length this page was fetched with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<i64>,
}

/// A page of entities from a list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    /// Entities on this page
    #[serde(default = "Vec::new")]
    pub entities: Vec<T>,
    /// Pagination metadata
    pub metadata: ListMetadata,
}

// `total_matches` is only trusted after the first page has been fetched;
// until then any positive sentinel keeps the loop alive.
const TOTAL_MATCHES_SENTINEL: i64 = i64::MAX;

/// Drain every page of the VM list endpoint.
pub async fn list_all_vms(
    api: &dyn PrismApi,
    filter: Option<String>,
) -> Result<Vec<VmEntity>, PrismError> {
    let length = crate::models::EntityKind::Vm.page_length();
    let mut entities = Vec::new();
    let mut offset = 0;
    let mut total = TOTAL_MATCHES_SENTINEL;
    while offset < total {
        let page = api
            .list_vms(ListRequest::page(filter.clone(), offset, length))
            .await?;
        total = page.metadata.total_matches;
        entities.extend(page.entities);
        offset += length;
    }
    Ok(entities)
}

/// Drain every page of the subnet list endpoint.
pub async fn list_all_subnets(
    api: &dyn PrismApi,
    filter: Option<String>,
) -> Result<Vec<SubnetEntity>, PrismError> {
    let length = crate::models::EntityKind::Subnet.page_length();
    let mut entities = Vec::new();
    let mut offset = 0;
    let mut total = TOTAL_MATCHES_SENTINEL;
    while offset < total {
        let page = api
            .list_subnets(ListRequest::page(filter.clone(), offset, length))
            .await?;
        total = page.metadata.total_matches;
        entities.extend(page.entities);
        offset += length;
    }
    Ok(entities)
}

/// Drain every page of the image list endpoint.
pub async fn list_all_images(
    api: &dyn PrismApi,
    filter: Option<String>,
) -> Result<Vec<ImageEntity>, PrismError> {
    let length = crate::models::EntityKind::Image.page_length();
    let mut entities = Vec::new();
    let mut offset = 0;
    let mut total = TOTAL_MATCHES_SENTINEL;
    while offset < total {
        let page = api
            .list_images(ListRequest::page(filter.clone(), offset, length))
            .await?;
        total = page.metadata.total_matches;
        entities.extend(page.entities);
        offset += length;
    }
    Ok(entities)
}

/// Drain every page of the cluster list endpoint.
pub async fn list_all_clusters(
    api: &dyn PrismApi,
    filter: Option<String>,
) -> Result<Vec<ClusterEntity>, PrismError> {
    let length = crate::models::EntityKind::Cluster.page_length();
    let mut entities = Vec::new();
    let mut offset = 0;
    let mut total = TOTAL_MATCHES_SENTINEL;
    while offset < total {
        let page = api
            .list_clusters(ListRequest::page(filter.clone(), offset, length))
            .await?;
        total = page.metadata.total_matches;
        entities.extend(page.entities);
        offset += length;
    }
    Ok(entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPrismClient;

    #[tokio::test]
    async fn drain_fetches_exactly_ceil_total_over_length_pages() {
        let mock = MockPrismClient::new();
        // Image pages are 100 long; 250 entities need exactly 3 fetches.
        for i in 0..250 {
            mock.add_image(MockPrismClient::image_fixture(
                &format!("img-{i}"),
                &format!("image-{i}"),
            ));
        }

        let images = list_all_images(&mock, None).await.unwrap();
        assert_eq!(images.len(), 250);
        assert_eq!(mock.calls_matching("POST /images/list"), 3);
    }

    #[tokio::test]
    async fn empty_collection_stops_after_one_page() {
        let mock = MockPrismClient::new();
        let vms = list_all_vms(&mock, None).await.unwrap();
        assert!(vms.is_empty());
        assert_eq!(mock.calls_matching("POST /vms/list"), 1);
    }

    #[tokio::test]
    async fn filtered_drain_only_returns_matches() {
        let mock = MockPrismClient::new();
        mock.add_subnet(MockPrismClient::subnet_fixture("subnet-1", "vlan.10"));
        mock.add_subnet(MockPrismClient::subnet_fixture("subnet-2", "vlan.20"));

        let subnets = list_all_subnets(&mock, Some("name==vlan.10".to_string()))
            .await
            .unwrap();
        assert_eq!(subnets.len(), 1);
        assert_eq!(
            subnets[0].metadata.uuid.as_deref(),
            Some("subnet-1")
        );
    }
}

