//! Declared desired-state input types.
//!
//! Field names mirror the provider's own vocabulary (`cpu`, `vcpu`, `memory`,
//! `disk_list`, `nic_list`, `guest_customization`) so an operation document
//! reads like the entity it describes. One document describes one operation
//! against one resource.

use serde::Deserialize;

/// Desired lifecycle state of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    /// Resource should exist and match the declared spec
    #[default]
    Present,
    /// Resource should not exist
    Absent,
    /// VM should be powered on
    Poweron,
    /// VM should be powered off
    Poweroff,
}

/// A reference to another entity by name or UUID.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefParam {
    /// Entity name
    #[serde(default)]
    pub name: Option<String>,
    /// Entity UUID
    #[serde(default)]
    pub uuid: Option<String>,
}

impl RefParam {
    /// The UUID if given, otherwise the name.
    pub fn name_or_uuid(&self) -> Option<&str> {
        self.uuid.as_deref().or(self.name.as_deref())
    }
}

/// One declared disk.
#[derive(Debug, Clone, Deserialize)]
pub struct DiskParam {
    /// `DISK` or `CDROM`
    #[serde(default = "default_device_type")]
    pub device_type: String,
    /// `SCSI` or `SATA`; each adapter type gets its own device index counter
    #[serde(default = "default_adapter_type")]
    pub adapter_type: String,
    /// Disk size in MiB; mandatory for blank data disks
    #[serde(default)]
    pub size_mib: Option<u64>,
    /// Image to clone from; absent means a blank data disk
    #[serde(default)]
    pub data_source: Option<RefParam>,
    /// Storage container placement, resolved per cluster when given by name
    #[serde(default)]
    pub storage_container: Option<RefParam>,
}

fn default_device_type() -> String {
    "DISK".to_string()
}

fn default_adapter_type() -> String {
    "SCSI".to_string()
}

/// One declared NIC.
#[derive(Debug, Clone, Deserialize)]
pub struct NicParam {
    /// Subnet the NIC attaches to
    pub subnet_reference: RefParam,
    /// NIC type; `NORMAL_NIC` unless overridden
    #[serde(default)]
    pub nic_type: Option<String>,
    /// VLAN mode; `ACCESS` unless overridden
    #[serde(default)]
    pub vlan_mode: Option<String>,
    /// Link state; connected unless overridden
    #[serde(default)]
    pub is_connected: Option<bool>,
    /// Multi-queue depth
    #[serde(default)]
    pub num_queues: Option<u32>,
}

/// Declared guest customization. For each mechanism, exactly one of the
/// inline and file variants may be set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuestCustomizationParams {
    /// Inline cloud-init user data
    #[serde(default)]
    pub cloud_init: Option<String>,
    /// Path to a cloud-init user data file
    #[serde(default)]
    pub cloud_init_file: Option<String>,
    /// Inline sysprep unattend.xml
    #[serde(default)]
    pub sysprep: Option<String>,
    /// Path to a sysprep unattend.xml file
    #[serde(default)]
    pub sysprep_file: Option<String>,
    /// Sysprep install type, `FRESH` or `PREPARED`
    #[serde(default)]
    pub install_type: Option<String>,
}

/// Declared desired state for a VM.
#[derive(Debug, Clone, Deserialize)]
pub struct VmParams {
    /// VM name
    #[serde(default)]
    pub name: Option<String>,
    /// Explicit UUID; disambiguates when several VMs share the name
    #[serde(default)]
    pub vm_uuid: Option<String>,
    /// Cluster to place the VM on, by name or UUID; immutable after create
    #[serde(default)]
    pub cluster: Option<String>,
    /// CPU socket count
    #[serde(default)]
    pub cpu: Option<u32>,
    /// Cores per socket
    #[serde(default)]
    pub vcpu: Option<u32>,
    /// Memory in MiB
    #[serde(default)]
    pub memory: Option<u64>,
    /// Ordered disk list; index order determines device_index assignment
    #[serde(default)]
    pub disk_list: Vec<DiskParam>,
    /// Ordered NIC list
    #[serde(default)]
    pub nic_list: Vec<NicParam>,
    /// Guest customization
    #[serde(default)]
    pub guest_customization: Option<GuestCustomizationParams>,
    /// Desired lifecycle state
    #[serde(default)]
    pub state: State,
    /// Report the computed change without issuing any mutating call
    #[serde(default)]
    pub dry_run: bool,
}

/// Declared DHCP/IPAM configuration for a subnet.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IpConfigParams {
    /// Network address; mandatory unless the whole block is empty
    #[serde(default)]
    pub subnet_ip: Option<String>,
    /// Prefix length; mandatory unless the whole block is empty
    #[serde(default)]
    pub prefix_length: Option<u8>,
    /// Default gateway handed to guests
    #[serde(default)]
    pub default_gateway_ip: Option<String>,
    /// DHCP server address override
    #[serde(default)]
    pub dhcp_server_address: Option<String>,
    /// DHCP pool ranges, each `"<start> <end>"`
    #[serde(default)]
    pub pool_list: Vec<String>,
    /// DNS servers handed to guests
    #[serde(default)]
    pub domain_name_server_list: Vec<String>,
    /// Search domain handed to guests
    #[serde(default)]
    pub domain_name: Option<String>,
}

impl IpConfigParams {
    /// Whether every field is unset; an empty block clears the subnet's
    /// existing IPAM configuration.
    pub fn is_empty(&self) -> bool {
        self.subnet_ip.is_none()
            && self.prefix_length.is_none()
            && self.default_gateway_ip.is_none()
            && self.dhcp_server_address.is_none()
            && self.pool_list.is_empty()
            && self.domain_name_server_list.is_empty()
            && self.domain_name.is_none()
    }
}

/// Declared desired state for a subnet.
#[derive(Debug, Clone, Deserialize)]
pub struct SubnetParams {
    /// Subnet name
    #[serde(default)]
    pub name: Option<String>,
    /// Explicit UUID; disambiguates when several subnets share the name
    #[serde(default)]
    pub subnet_uuid: Option<String>,
    /// Cluster the subnet is scoped to, by name or UUID; immutable
    #[serde(default)]
    pub cluster: Option<String>,
    /// VLAN id; immutable after create
    #[serde(default)]
    pub vlan_id: Option<i64>,
    /// Virtual switch carrying the subnet, by name or UUID
    #[serde(default)]
    pub virtual_switch: Option<RefParam>,
    /// DHCP/IPAM configuration; an empty block clears an existing one
    #[serde(default)]
    pub ip_config: Option<IpConfigParams>,
    /// Desired lifecycle state
    #[serde(default)]
    pub state: State,
    /// Report the computed change without issuing any mutating call
    #[serde(default)]
    pub dry_run: bool,
}

/// Declared desired state for an image.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageParams {
    /// Image name
    #[serde(default)]
    pub name: Option<String>,
    /// Explicit UUID; disambiguates when several images share the name
    #[serde(default)]
    pub image_uuid: Option<String>,
    /// Free-form description
    #[serde(default)]
    pub desc: Option<String>,
    /// URL the image content is fetched from
    #[serde(default)]
    pub source_uri: Option<String>,
    /// `ISO_IMAGE` or `DISK_IMAGE`; inferred from the source URL extension
    /// when unset
    #[serde(default)]
    pub image_type: Option<String>,
    /// Rename the image to this name on update
    #[serde(default)]
    pub new_image_name: Option<String>,
    /// Change the image type on update
    #[serde(default)]
    pub new_image_type: Option<String>,
    /// Create despite duplicate names; on delete, remove every duplicate
    #[serde(default)]
    pub force: bool,
    /// Desired lifecycle state
    #[serde(default)]
    pub state: State,
    /// Report the computed change without issuing any mutating call
    #[serde(default)]
    pub dry_run: bool,
}

/// One operation against one resource, tagged by resource kind.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "resource", rename_all = "snake_case")]
pub enum Operation {
    /// VM lifecycle operation
    Vm(VmParams),
    /// Subnet lifecycle operation
    Subnet(SubnetParams),
    /// Image lifecycle operation
    Image(ImageParams),
}
