//! Test utilities for unit testing reconcilers and diffs.
//!
//! Helpers for building observed entities in the shape the API returns them:
//! spec and status populated, server-assigned UUIDs on devices.

use prism_client::*;

/// Build a server-shaped metadata block.
pub fn observed_metadata(kind: EntityKind, uuid: &str) -> Metadata {
    Metadata {
        kind: kind.kind_str().to_string(),
        uuid: Some(uuid.to_string()),
        name: None,
        spec_version: Some(3),
        entity_version: Some("5".to_string()),
        extra: serde_json::Map::new(),
    }
}

/// A disk as the server reports it: carrying a UUID and full addressing.
pub fn observed_disk(
    uuid: &str,
    adapter_type: &str,
    device_index: i64,
    source_uuid: Option<&str>,
) -> DiskSpec {
    DiskSpec {
        uuid: Some(uuid.to_string()),
        device_properties: Some(DeviceProperties {
            disk_address: DiskAddress {
                device_index,
                adapter_type: adapter_type.to_string(),
            },
            device_type: "DISK".to_string(),
        }),
        data_source_reference: source_uuid.map(|u| Reference::new(EntityKind::Image, u)),
        disk_size_mib: Some(20_480),
        storage_config: None,
        extra: serde_json::Map::new(),
    }
}

/// The server-injected guest customization CD-ROM slot.
pub fn observed_cdrom(uuid: &str) -> DiskSpec {
    DiskSpec {
        uuid: Some(uuid.to_string()),
        device_properties: Some(DeviceProperties {
            disk_address: DiskAddress {
                device_index: 0,
                adapter_type: "IDE".to_string(),
            },
            device_type: "CDROM".to_string(),
        }),
        data_source_reference: None,
        disk_size_mib: None,
        storage_config: None,
        extra: serde_json::Map::new(),
    }
}

/// A disk as the builder produces it: no UUID yet.
pub fn desired_disk(adapter_type: &str, device_index: i64, source_uuid: Option<&str>) -> DiskSpec {
    DiskSpec {
        uuid: None,
        ..observed_disk("", adapter_type, device_index, source_uuid)
    }
}

/// A NIC as the server reports it.
pub fn observed_nic(uuid: &str, subnet_uuid: &str) -> NicSpec {
    NicSpec {
        uuid: Some(uuid.to_string()),
        nic_type: Some("NORMAL_NIC".to_string()),
        vlan_mode: Some("ACCESS".to_string()),
        subnet_reference: Reference::new(EntityKind::Subnet, subnet_uuid),
        is_connected: Some(true),
        num_queues: None,
        ip_endpoint_list: None,
        extra: serde_json::Map::new(),
    }
}

/// A NIC as the builder produces it: no UUID yet.
pub fn desired_nic(subnet_uuid: &str) -> NicSpec {
    NicSpec {
        uuid: None,
        ..observed_nic("", subnet_uuid)
    }
}

/// An observed VM entity with spec and status populated.
pub fn observed_vm(
    uuid: &str,
    name: &str,
    cluster_uuid: &str,
    disks: Vec<DiskSpec>,
    nics: Vec<NicSpec>,
    power: PowerState,
) -> VmEntity {
    let resources = VmResources {
        num_sockets: Some(2),
        num_vcpus_per_socket: Some(2),
        memory_size_mib: Some(2048),
        power_state: Some(power),
        power_state_mechanism: None,
        nic_list: nics,
        disk_list: disks,
        guest_customization: None,
        extra: serde_json::Map::new(),
    };
    VmEntity {
        api_version: Some("3.1.0".to_string()),
        metadata: observed_metadata(EntityKind::Vm, uuid),
        spec: Some(VmSpec {
            name: name.to_string(),
            cluster_reference: Some(Reference::new(EntityKind::Cluster, cluster_uuid)),
            resources: resources.clone(),
            extra: serde_json::Map::new(),
        }),
        status: Some(VmStatus {
            name: Some(name.to_string()),
            state: Some("COMPLETE".to_string()),
            resources: Some(resources),
            cluster_reference: Some(Reference::new(EntityKind::Cluster, cluster_uuid)),
            execution_context: None,
            extra: serde_json::Map::new(),
        }),
    }
}

/// A desired VM payload in the shape the builder emits.
pub fn desired_vm(
    name: &str,
    cluster_uuid: Option<&str>,
    disks: Vec<DiskSpec>,
    nics: Vec<NicSpec>,
) -> VmEntity {
    VmEntity {
        api_version: Some("3.1.0".to_string()),
        metadata: Metadata::for_create(EntityKind::Vm),
        spec: Some(VmSpec {
            name: name.to_string(),
            cluster_reference: cluster_uuid.map(|u| Reference::new(EntityKind::Cluster, u)),
            resources: VmResources {
                num_sockets: Some(2),
                num_vcpus_per_socket: Some(2),
                memory_size_mib: Some(2048),
                power_state: Some(PowerState::On),
                power_state_mechanism: None,
                nic_list: nics,
                disk_list: disks,
                guest_customization: None,
                extra: serde_json::Map::new(),
            },
            extra: serde_json::Map::new(),
        }),
        status: None,
    }
}

/// An observed subnet entity with spec and status populated.
pub fn observed_subnet(
    uuid: &str,
    name: &str,
    cluster_uuid: &str,
    vlan_id: i64,
    vswitch_uuid: &str,
) -> SubnetEntity {
    SubnetEntity {
        api_version: Some("3.1.0".to_string()),
        metadata: observed_metadata(EntityKind::Subnet, uuid),
        spec: Some(SubnetSpec {
            name: name.to_string(),
            cluster_reference: Some(Reference::new(EntityKind::Cluster, cluster_uuid)),
            resources: SubnetResources {
                subnet_type: Some("VLAN".to_string()),
                vlan_id: Some(vlan_id),
                virtual_switch_uuid: Some(vswitch_uuid.to_string()),
                vswitch_name: Some("vs0".to_string()),
                is_external: None,
                ip_config: None,
                extra: serde_json::Map::new(),
            },
            extra: serde_json::Map::new(),
        }),
        status: Some(EntityStatus {
            name: Some(name.to_string()),
            state: Some("COMPLETE".to_string()),
            execution_context: None,
            extra: serde_json::Map::new(),
        }),
    }
}
