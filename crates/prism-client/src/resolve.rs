//! Entity resolution: human name or UUID to canonical UUID
//!
//! Input that is already syntactically a UUID is returned unchanged with no
//! network call. Names are resolved through the paginated list endpoints with
//! an equality filter; more than one match is an [`PrismError::AmbiguousName`]
//! carrying every candidate UUID rather than a guess.
//!
//! Virtual switches and storage containers are cluster-scoped and have no list
//! endpoint of their own; they resolve through a grouped-aggregation query
//! keyed jointly by cluster and name.

use crate::error::PrismError;
use crate::models::*;
use crate::pagination;
use crate::prism_trait::PrismApi;
use std::collections::HashMap;
use tracing::debug;

/// Whether the input is syntactically a UUID.
pub fn is_uuid(input: &str) -> bool {
    uuid::Uuid::parse_str(input).is_ok()
}

/// Entities that expose a UUID and a display name.
pub trait NamedEntity {
    /// Entity UUID from metadata.
    fn uuid(&self) -> Option<&str>;
    /// Name as reported in the status subtree.
    fn display_name(&self) -> Option<&str>;
}

impl NamedEntity for VmEntity {
    fn uuid(&self) -> Option<&str> {
        self.metadata.uuid.as_deref()
    }
    fn display_name(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.name.as_deref())
    }
}

impl NamedEntity for SubnetEntity {
    fn uuid(&self) -> Option<&str> {
        self.metadata.uuid.as_deref()
    }
    fn display_name(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.name.as_deref())
    }
}

impl NamedEntity for ImageEntity {
    fn uuid(&self) -> Option<&str> {
        self.metadata.uuid.as_deref()
    }
    fn display_name(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.name.as_deref())
    }
}

impl NamedEntity for ClusterEntity {
    fn uuid(&self) -> Option<&str> {
        self.metadata.uuid.as_deref()
    }
    fn display_name(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.name.as_deref())
    }
}

fn matching_uuids<T: NamedEntity>(entities: &[T], name: &str) -> Vec<String> {
    entities
        .iter()
        .filter(|e| e.display_name() == Some(name))
        .filter_map(|e| e.uuid().map(String::from))
        .collect()
}

/// Find every UUID whose entity carries exactly the given name.
///
/// # Errors
/// Propagates list failures; an empty result is not an error here.
pub async fn find_uuids_by_name(
    api: &dyn PrismApi,
    kind: EntityKind,
    name: &str,
) -> Result<Vec<String>, PrismError> {
    let filter = Some(format!("{}=={}", kind.filter_attribute(), name));
    let uuids = match kind {
        EntityKind::Vm => {
            matching_uuids(&pagination::list_all_vms(api, filter).await?, name)
        }
        EntityKind::Subnet => {
            matching_uuids(&pagination::list_all_subnets(api, filter).await?, name)
        }
        EntityKind::Image => {
            matching_uuids(&pagination::list_all_images(api, filter).await?, name)
        }
        EntityKind::Cluster => {
            matching_uuids(&pagination::list_all_clusters(api, filter).await?, name)
        }
        EntityKind::StorageContainer | EntityKind::VirtualSwitch => {
            return Err(PrismError::InvalidRequest(format!(
                "{kind} is cluster-scoped; resolve it with a cluster UUID"
            )));
        }
    };
    debug!("Resolved {} name '{}' to {} match(es)", kind, name, uuids.len());
    Ok(uuids)
}

/// Resolve a name or UUID to a canonical UUID.
///
/// # Errors
/// [`PrismError::NotFound`] when nothing matches, [`PrismError::AmbiguousName`]
/// when several entities carry the name.
pub async fn resolve(
    api: &dyn PrismApi,
    kind: EntityKind,
    name_or_uuid: &str,
) -> Result<String, PrismError> {
    if is_uuid(name_or_uuid) {
        return Ok(name_or_uuid.to_string());
    }

    let mut uuids = find_uuids_by_name(api, kind, name_or_uuid).await?;
    match uuids.len() {
        0 => Err(PrismError::NotFound(format!(
            "Could not find {kind} '{name_or_uuid}'"
        ))),
        1 => Ok(uuids.remove(0)),
        _ => Err(PrismError::AmbiguousName {
            kind: kind.kind_str().to_string(),
            name: name_or_uuid.to_string(),
            uuids,
        }),
    }
}

async fn cluster_scoped_map(
    api: &dyn PrismApi,
    entity_type: &str,
    name_attribute: &str,
    cluster_attribute: &str,
    name: &str,
) -> Result<HashMap<String, String>, PrismError> {
    let req = GroupsRequest {
        entity_type: entity_type.to_string(),
        filter_criteria: Some(format!("{name_attribute}=={name}")),
        group_member_attributes: vec![
            GroupAttribute {
                attribute: name_attribute.to_string(),
            },
            GroupAttribute {
                attribute: cluster_attribute.to_string(),
            },
        ],
    };
    let response = api.group_query(&req).await?;

    let mut map = HashMap::new();
    for group in &response.group_results {
        for entity in &group.entity_results {
            let cluster = entity
                .data
                .iter()
                .find(|d| d.name == cluster_attribute)
                .and_then(GroupFieldData::first_value);
            if let Some(cluster_uuid) = cluster {
                map.insert(cluster_uuid.to_string(), entity.entity_id.clone());
            }
        }
    }
    Ok(map)
}

/// Map cluster UUID to virtual switch UUID for every cluster carrying a
/// virtual switch with the given name.
///
/// # Errors
/// Propagates groups-query failures.
pub async fn virtual_switches_by_cluster(
    api: &dyn PrismApi,
    name: &str,
) -> Result<HashMap<String, String>, PrismError> {
    cluster_scoped_map(
        api,
        "distributed_virtual_switch",
        "name",
        "cluster_configuration_list.cluster_uuid",
        name,
    )
    .await
}

/// Resolve a virtual switch by name or UUID within one cluster.
///
/// # Errors
/// [`PrismError::NotFound`] when the name exists nowhere or not on the given
/// cluster.
pub async fn resolve_virtual_switch(
    api: &dyn PrismApi,
    name_or_uuid: &str,
    cluster_uuid: &str,
) -> Result<String, PrismError> {
    if is_uuid(name_or_uuid) {
        return Ok(name_or_uuid.to_string());
    }

    let map = virtual_switches_by_cluster(api, name_or_uuid).await?;
    if map.is_empty() {
        return Err(PrismError::NotFound(format!(
            "Could not find virtual switch '{name_or_uuid}'"
        )));
    }
    map.get(cluster_uuid).cloned().ok_or_else(|| {
        PrismError::NotFound(format!(
            "Virtual switch '{name_or_uuid}' does not exist on cluster '{cluster_uuid}'"
        ))
    })
}

/// Map cluster UUID to storage container UUID for every cluster carrying a
/// container with the given name.
///
/// # Errors
/// Propagates groups-query failures.
pub async fn storage_containers_by_cluster(
    api: &dyn PrismApi,
    name: &str,
) -> Result<HashMap<String, String>, PrismError> {
    cluster_scoped_map(api, "storage_container", "container_name", "cluster", name).await
}

/// Resolve a storage container by name or UUID within one cluster.
///
/// # Errors
/// [`PrismError::NotFound`] when the name exists nowhere or not on the given
/// cluster.
pub async fn resolve_storage_container(
    api: &dyn PrismApi,
    name_or_uuid: &str,
    cluster_uuid: &str,
) -> Result<String, PrismError> {
    if is_uuid(name_or_uuid) {
        return Ok(name_or_uuid.to_string());
    }

    let map = storage_containers_by_cluster(api, name_or_uuid).await?;
    if map.is_empty() {
        return Err(PrismError::NotFound(format!(
            "Could not find storage container '{name_or_uuid}'"
        )));
    }
    map.get(cluster_uuid).cloned().ok_or_else(|| {
        PrismError::NotFound(format!(
            "Storage container '{name_or_uuid}' does not exist on cluster '{cluster_uuid}'"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPrismClient;

    #[test]
    fn uuid_detection() {
        assert!(is_uuid("7527f349-b772-4b17-be71-41af0492c4ba"));
        assert!(!is_uuid("vlan.10"));
        assert!(!is_uuid(""));
    }

    #[tokio::test]
    async fn uuid_passthrough_makes_no_network_call() {
        let mock = MockPrismClient::new();
        let uuid = "7527f349-b772-4b17-be71-41af0492c4ba";
        let resolved = resolve(&mock, EntityKind::Image, uuid).await.unwrap();
        assert_eq!(resolved, uuid);
        assert!(mock.journal().is_empty());
    }

    #[tokio::test]
    async fn name_resolves_to_single_uuid() {
        let mock = MockPrismClient::new();
        mock.add_image(MockPrismClient::image_fixture("img-1", "centos-image"));
        let resolved = resolve(&mock, EntityKind::Image, "centos-image")
            .await
            .unwrap();
        assert_eq!(resolved, "img-1");
    }

    #[tokio::test]
    async fn missing_name_is_not_found() {
        let mock = MockPrismClient::new();
        let err = resolve(&mock, EntityKind::Cluster, "no-such-cluster")
            .await
            .unwrap_err();
        assert!(matches!(err, PrismError::NotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_names_are_ambiguous() {
        let mock = MockPrismClient::new();
        mock.add_image(MockPrismClient::image_fixture("img-1", "centos-image"));
        mock.add_image(MockPrismClient::image_fixture("img-2", "centos-image"));
        let err = resolve(&mock, EntityKind::Image, "centos-image")
            .await
            .unwrap_err();
        match err {
            PrismError::AmbiguousName { uuids, .. } => {
                assert_eq!(uuids.len(), 2);
                assert!(uuids.contains(&"img-1".to_string()));
                assert!(uuids.contains(&"img-2".to_string()));
            }
            other => panic!("expected AmbiguousName, got {other}"),
        }
    }

    #[tokio::test]
    async fn virtual_switch_resolution_is_cluster_scoped() {
        let mock = MockPrismClient::new();
        mock.add_virtual_switch("cluster-a", "vs0", "vs-uuid-a");
        mock.add_virtual_switch("cluster-b", "vs0", "vs-uuid-b");

        let resolved = resolve_virtual_switch(&mock, "vs0", "cluster-b")
            .await
            .unwrap();
        assert_eq!(resolved, "vs-uuid-b");

        let err = resolve_virtual_switch(&mock, "vs0", "cluster-c")
            .await
            .unwrap_err();
        assert!(matches!(err, PrismError::NotFound(_)));
    }
}
