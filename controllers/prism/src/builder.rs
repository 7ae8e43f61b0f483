//! Builds provider payloads from declared desired state.
//!
//! Every named reference (cluster, image, subnet, virtual switch, storage
//! container) is resolved to a UUID here, before any mutating call is issued.
//! A build failure therefore aborts the operation with no partial side effect.

use crate::error::ControllerError;
use crate::params::*;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use prism_client::prism_trait::PrismApi;
use prism_client::resolve;
use prism_client::*;
use std::collections::HashMap;

fn reference_input(entity: &str, index: usize, r: &RefParam) -> Result<String, ControllerError> {
    r.name_or_uuid().map(String::from).ok_or_else(|| {
        ControllerError::InvalidConfig(format!(
            "{entity} reference at index {index} has neither name nor uuid"
        ))
    })
}

async fn build_disk_list(
    api: &dyn PrismApi,
    params: &VmParams,
    cluster_uuid: Option<&str>,
) -> Result<Vec<DiskSpec>, ControllerError> {
    // SCSI and SATA each get an independent zero-based device index counter,
    // incremented per disk of that adapter type in declaration order.
    let mut counters: HashMap<String, i64> = HashMap::new();
    let mut disks = Vec::with_capacity(params.disk_list.len());

    for (index, disk) in params.disk_list.iter().enumerate() {
        let data_source_reference = match &disk.data_source {
            Some(source) => {
                let input = reference_input("disk data source", index, source)?;
                let uuid = resolve::resolve(api, EntityKind::Image, &input).await?;
                Some(Reference::new(EntityKind::Image, uuid))
            }
            None => None,
        };

        if data_source_reference.is_none() && disk.size_mib.is_none() {
            return Err(ControllerError::InvalidConfig(format!(
                "disk at index {index} must specify a data source or a size"
            )));
        }

        let storage_config = match &disk.storage_container {
            Some(container) => {
                let input = reference_input("storage container", index, container)?;
                let uuid = if resolve::is_uuid(&input) {
                    input
                } else {
                    let cluster = cluster_uuid.ok_or_else(|| {
                        ControllerError::InvalidConfig(
                            "a cluster is required to resolve a storage container by name"
                                .to_string(),
                        )
                    })?;
                    resolve::resolve_storage_container(api, &input, cluster).await?
                };
                Some(StorageConfig {
                    storage_container_reference: Reference::new(EntityKind::StorageContainer, uuid),
                })
            }
            None => None,
        };

        let counter = counters.entry(disk.adapter_type.clone()).or_insert(0);
        let device_index = *counter;
        *counter += 1;

        disks.push(DiskSpec {
            uuid: None,
            device_properties: Some(DeviceProperties {
                disk_address: DiskAddress {
                    device_index,
                    adapter_type: disk.adapter_type.clone(),
                },
                device_type: disk.device_type.clone(),
            }),
            data_source_reference,
            disk_size_mib: disk.size_mib,
            storage_config,
            extra: serde_json::Map::new(),
        });
    }

    Ok(disks)
}

async fn build_nic_list(
    api: &dyn PrismApi,
    params: &VmParams,
) -> Result<Vec<NicSpec>, ControllerError> {
    let mut nics = Vec::with_capacity(params.nic_list.len());

    for (index, nic) in params.nic_list.iter().enumerate() {
        let input = reference_input("NIC subnet", index, &nic.subnet_reference)?;
        let uuid = resolve::resolve(api, EntityKind::Subnet, &input).await?;

        nics.push(NicSpec {
            uuid: None,
            nic_type: Some(nic.nic_type.clone().unwrap_or_else(|| "NORMAL_NIC".to_string())),
            vlan_mode: Some(nic.vlan_mode.clone().unwrap_or_else(|| "ACCESS".to_string())),
            subnet_reference: Reference::new(EntityKind::Subnet, uuid),
            is_connected: Some(nic.is_connected.unwrap_or(true)),
            num_queues: nic.num_queues,
            ip_endpoint_list: None,
            extra: serde_json::Map::new(),
        });
    }

    Ok(nics)
}

fn content_from(
    inline: Option<&str>,
    file: Option<&str>,
    mechanism: &str,
) -> Result<Option<String>, ControllerError> {
    match (inline, file) {
        (Some(_), Some(_)) => Err(ControllerError::InvalidConfig(format!(
            "{mechanism} and {mechanism}_file are mutually exclusive"
        ))),
        (Some(text), None) => Ok(Some(text.to_string())),
        (None, Some(path)) => Ok(Some(std::fs::read_to_string(path)?)),
        (None, None) => Ok(None),
    }
}

/// Build the guest customization payload, enforcing the inline/file and
/// cloud-init/sysprep exclusivity rules. Content is base64-encoded.
pub fn build_guest_customization(
    params: &GuestCustomizationParams,
) -> Result<Option<GuestCustomization>, ControllerError> {
    let cloud_init = content_from(
        params.cloud_init.as_deref(),
        params.cloud_init_file.as_deref(),
        "cloud_init",
    )?;
    let sysprep = content_from(
        params.sysprep.as_deref(),
        params.sysprep_file.as_deref(),
        "sysprep",
    )?;

    if cloud_init.is_some() && sysprep.is_some() {
        return Err(ControllerError::InvalidConfig(
            "cloud_init and sysprep are mutually exclusive".to_string(),
        ));
    }

    if let Some(user_data) = cloud_init {
        return Ok(Some(GuestCustomization {
            cloud_init: Some(CloudInit {
                user_data: BASE64.encode(user_data),
            }),
            sysprep: None,
        }));
    }

    if let Some(unattend_xml) = sysprep {
        let install_type = params
            .install_type
            .clone()
            .unwrap_or_else(|| "FRESH".to_string());
        if install_type != "FRESH" && install_type != "PREPARED" {
            return Err(ControllerError::InvalidConfig(format!(
                "install_type must be FRESH or PREPARED, got '{install_type}'"
            )));
        }
        return Ok(Some(GuestCustomization {
            cloud_init: None,
            sysprep: Some(Sysprep {
                install_type,
                unattend_xml: BASE64.encode(unattend_xml),
            }),
        }));
    }

    Ok(None)
}

/// Build the full VM intent payload from declared parameters.
///
/// # Errors
/// Configuration errors for missing or mutually exclusive fields; resolution
/// errors for names that match zero or several entities.
pub async fn build_vm_payload(
    api: &dyn PrismApi,
    params: &VmParams,
) -> Result<VmEntity, ControllerError> {
    let name = params.name.clone().ok_or_else(|| {
        ControllerError::InvalidConfig("VM name is required".to_string())
    })?;

    let cluster_reference = match &params.cluster {
        Some(cluster) => {
            let uuid = resolve::resolve(api, EntityKind::Cluster, cluster).await?;
            Some(Reference::new(EntityKind::Cluster, uuid))
        }
        None => None,
    };
    let cluster_uuid = cluster_reference
        .as_ref()
        .and_then(|r| r.uuid.as_deref())
        .map(String::from);

    let disk_list = build_disk_list(api, params, cluster_uuid.as_deref()).await?;
    let nic_list = build_nic_list(api, params).await?;
    let guest_customization = match &params.guest_customization {
        Some(gc) => build_guest_customization(gc)?,
        None => None,
    };

    // Power defaults to ON; the poweroff state declares the VM off.
    let power_state = match params.state {
        State::Poweroff => PowerState::Off,
        _ => PowerState::On,
    };

    Ok(VmEntity {
        api_version: Some("3.1.0".to_string()),
        metadata: Metadata::for_create(EntityKind::Vm),
        spec: Some(VmSpec {
            name,
            cluster_reference,
            resources: VmResources {
                num_sockets: params.cpu,
                num_vcpus_per_socket: params.vcpu,
                memory_size_mib: params.memory,
                power_state: Some(power_state),
                power_state_mechanism: None,
                nic_list,
                disk_list,
                guest_customization,
                extra: serde_json::Map::new(),
            },
            extra: serde_json::Map::new(),
        }),
        status: None,
    })
}

fn build_ip_config(params: &IpConfigParams) -> Result<Option<IpConfig>, ControllerError> {
    // A wholly empty block clears an existing IPAM configuration.
    if params.is_empty() {
        return Ok(None);
    }

    let subnet_ip = params.subnet_ip.clone().ok_or_else(|| {
        ControllerError::InvalidConfig("ip_config requires subnet_ip".to_string())
    })?;
    let prefix_length = params.prefix_length.ok_or_else(|| {
        ControllerError::InvalidConfig("ip_config requires prefix_length".to_string())
    })?;

    let dhcp_options = if params.domain_name_server_list.is_empty() && params.domain_name.is_none()
    {
        None
    } else {
        Some(DhcpOptions {
            domain_name_server_list: (!params.domain_name_server_list.is_empty())
                .then(|| params.domain_name_server_list.clone()),
            domain_name: params.domain_name.clone(),
        })
    };

    Ok(Some(IpConfig {
        subnet_ip: Some(subnet_ip),
        prefix_length: Some(prefix_length),
        default_gateway_ip: params.default_gateway_ip.clone(),
        dhcp_server_address: params
            .dhcp_server_address
            .clone()
            .map(|ip| DhcpServerAddress { ip }),
        pool_list: (!params.pool_list.is_empty()).then(|| {
            params
                .pool_list
                .iter()
                .map(|range| DhcpPool {
                    range: range.clone(),
                })
                .collect()
        }),
        dhcp_options,
    }))
}

/// Build the full subnet intent payload from declared parameters.
///
/// # Errors
/// Configuration errors for missing fields; resolution errors for the cluster
/// and virtual switch references.
pub async fn build_subnet_payload(
    api: &dyn PrismApi,
    params: &SubnetParams,
) -> Result<SubnetEntity, ControllerError> {
    let name = params.name.clone().ok_or_else(|| {
        ControllerError::InvalidConfig("subnet name is required".to_string())
    })?;

    let cluster_reference = match &params.cluster {
        Some(cluster) => {
            let uuid = resolve::resolve(api, EntityKind::Cluster, cluster).await?;
            Some(Reference::new(EntityKind::Cluster, uuid))
        }
        None => None,
    };

    let virtual_switch_uuid = match &params.virtual_switch {
        Some(vswitch) => {
            let input = reference_input("virtual switch", 0, vswitch)?;
            let uuid = if resolve::is_uuid(&input) {
                input
            } else {
                let cluster = cluster_reference
                    .as_ref()
                    .and_then(|r| r.uuid.as_deref())
                    .ok_or_else(|| {
                        ControllerError::InvalidConfig(
                            "a cluster is required to resolve a virtual switch by name"
                                .to_string(),
                        )
                    })?;
                resolve::resolve_virtual_switch(api, &input, cluster).await?
            };
            Some(uuid)
        }
        None => None,
    };

    let ip_config = match &params.ip_config {
        Some(config) => build_ip_config(config)?,
        None => None,
    };

    Ok(SubnetEntity {
        api_version: Some("3.1.0".to_string()),
        metadata: Metadata::for_create(EntityKind::Subnet),
        spec: Some(SubnetSpec {
            name,
            cluster_reference,
            resources: SubnetResources {
                subnet_type: Some("VLAN".to_string()),
                vlan_id: params.vlan_id,
                virtual_switch_uuid,
                vswitch_name: None,
                is_external: None,
                ip_config,
                extra: serde_json::Map::new(),
            },
            extra: serde_json::Map::new(),
        }),
        status: None,
    })
}

/// Infer the image type from the source URL extension.
pub fn infer_image_type(source_uri: &str) -> &'static str {
    if source_uri.to_lowercase().ends_with(".iso") {
        "ISO_IMAGE"
    } else {
        "DISK_IMAGE"
    }
}

/// Build the full image intent payload from declared parameters.
///
/// # Errors
/// Configuration errors for a missing name or source URL.
pub fn build_image_payload(params: &ImageParams) -> Result<ImageEntity, ControllerError> {
    let name = params.name.clone().ok_or_else(|| {
        ControllerError::InvalidConfig("image name is required".to_string())
    })?;
    let source_uri = params.source_uri.clone().ok_or_else(|| {
        ControllerError::InvalidConfig("source_uri is required to create an image".to_string())
    })?;

    let image_type = params
        .image_type
        .clone()
        .unwrap_or_else(|| infer_image_type(&source_uri).to_string());

    Ok(ImageEntity {
        api_version: Some("3.1.0".to_string()),
        metadata: Metadata::for_create(EntityKind::Image),
        spec: Some(ImageSpec {
            name,
            description: params.desc.clone(),
            resources: ImageResources {
                image_type: Some(image_type),
                source_uri: Some(source_uri),
                source_options: None,
                extra: serde_json::Map::new(),
            },
            extra: serde_json::Map::new(),
        }),
        status: None,
    })
}
