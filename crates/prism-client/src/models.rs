//! Prism Central v3 API models
//!
//! These models match the v3 intent-spec envelope: every entity carries
//! `metadata`, a writable `spec`, and a read-only `status` subtree that must
//! never be sent back on a write. Unknown server-managed fields are preserved
//! through `#[serde(flatten)]` maps so that observed payloads survive a
//! read-modify-write cycle intact.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Entity kinds addressable through the v3 API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Virtual machine
    Vm,
    /// Layer-2 subnet
    Subnet,
    /// Disk or ISO image
    Image,
    /// Prism Element cluster
    Cluster,
    /// Cluster-scoped storage container (resolved via the groups API)
    StorageContainer,
    /// Cluster-scoped distributed virtual switch (resolved via the groups API)
    VirtualSwitch,
}

impl EntityKind {
    /// The `metadata.kind` string for this entity kind.
    pub fn kind_str(self) -> &'static str {
        match self {
            EntityKind::Vm => "vm",
            EntityKind::Subnet => "subnet",
            EntityKind::Image => "image",
            EntityKind::Cluster => "cluster",
            EntityKind::StorageContainer => "storage_container",
            EntityKind::VirtualSwitch => "distributed_virtual_switch",
        }
    }

    /// Attribute name used in FIQL list filters for name equality.
    pub fn filter_attribute(self) -> &'static str {
        match self {
            EntityKind::Vm => "vm_name",
            _ => "name",
        }
    }

    /// Page length used when draining this kind's list endpoint.
    pub fn page_length(self) -> i64 {
        match self {
            EntityKind::Vm => 500,
            _ => 100,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.kind_str())
    }
}

/// A `{kind, uuid, name}` reference to another entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    /// Referenced entity kind
    pub kind: String,
    /// Referenced entity UUID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    /// Referenced entity name (server may echo it; never required on write)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Reference {
    /// Build a UUID-only reference of the given kind.
    pub fn new(kind: EntityKind, uuid: impl Into<String>) -> Self {
        Self {
            kind: kind.kind_str().to_string(),
            uuid: Some(uuid.into()),
            name: None,
        }
    }
}

/// Entity metadata: identity plus the optimistic-concurrency counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Entity kind string
    pub kind: String,
    /// Entity UUID (absent on create payloads)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    /// Entity name as known to metadata (images carry it here too)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Caller-incremented spec version; bumped on every update attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec_version: Option<u64>,
    /// Server-side entity version (stringly typed in the API)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_version: Option<String>,
    /// Server-managed fields (categories, timestamps, owner) preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Metadata {
    /// Fresh metadata for a create payload of the given kind.
    pub fn for_create(kind: EntityKind) -> Self {
        Self {
            kind: kind.kind_str().to_string(),
            uuid: None,
            name: None,
            spec_version: Some(0),
            entity_version: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Increment `spec_version`, treating a missing counter as zero.
    pub fn bump_spec_version(&mut self) {
        self.spec_version = Some(self.spec_version.unwrap_or(0) + 1);
    }

    /// Increment the stringly-typed `entity_version` if present and numeric.
    pub fn bump_entity_version(&mut self) {
        if let Some(v) = self.entity_version.as_deref()
            && let Ok(n) = v.parse::<u64>()
        {
            self.entity_version = Some((n + 1).to_string());
        }
    }
}

/// VM power states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PowerState {
    /// Powered on
    On,
    /// Powered off
    Off,
}

/// How a power-state transition is carried out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerStateMechanism {
    /// `HARD`, `ACPI` or `GUEST`
    pub mechanism: String,
}

impl PowerStateMechanism {
    /// Hard power transition (no guest cooperation).
    pub fn hard() -> Self {
        Self {
            mechanism: "HARD".to_string(),
        }
    }
}

/// Disk bus address: adapter type plus the per-adapter device index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskAddress {
    /// Zero-based index on the adapter's bus
    pub device_index: i64,
    /// `SCSI`, `PCI`, `SATA` or `IDE`
    pub adapter_type: String,
}

/// Device placement for a disk entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProperties {
    /// Bus placement
    pub disk_address: DiskAddress,
    /// `DISK` or `CDROM`
    pub device_type: String,
}

/// One VM disk entry. List position is semantically significant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskSpec {
    /// Server-assigned disk UUID; preserved across updates when the position survives
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    /// Bus placement and device type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_properties: Option<DeviceProperties>,
    /// Image to clone the disk from; absent means a blank data disk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_source_reference: Option<Reference>,
    /// Disk size for blank data disks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_size_mib: Option<u64>,
    /// Storage container placement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_config: Option<StorageConfig>,
    /// Server-managed fields preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl DiskSpec {
    /// Whether this entry is the server-injected guest-customization CD-ROM.
    pub fn is_cdrom(&self) -> bool {
        self.device_properties
            .as_ref()
            .is_some_and(|p| p.device_type == "CDROM")
    }
}

/// Storage container placement for a disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Container the disk lives in
    pub storage_container_reference: Reference,
}

/// An IP endpoint reported on a NIC (status subtree only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpEndpoint {
    /// Assigned address, empty until DHCP/IPAM hands one out
    #[serde(default)]
    pub ip: String,
    /// `ASSIGNED` or `LEARNED`
    #[serde(default, rename = "type")]
    pub endpoint_type: Option<String>,
}

/// One VM NIC entry. List position is semantically significant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NicSpec {
    /// Server-assigned NIC UUID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    /// NIC type, `NORMAL_NIC` unless overridden
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nic_type: Option<String>,
    /// VLAN mode, `ACCESS` unless overridden
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan_mode: Option<String>,
    /// Subnet the NIC attaches to
    pub subnet_reference: Reference,
    /// Link state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_connected: Option<bool>,
    /// Multi-queue depth
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_queues: Option<u32>,
    /// Reported addresses; populated in status, never written back
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_endpoint_list: Option<Vec<IpEndpoint>>,
    /// Server-managed fields preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Cloud-init guest customization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudInit {
    /// Base64-encoded user data
    pub user_data: String,
}

/// Sysprep guest customization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sysprep {
    /// `FRESH` or `PREPARED`
    pub install_type: String,
    /// Base64-encoded unattend.xml
    pub unattend_xml: String,
}

/// Guest customization payload; the API accepts exactly one mechanism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestCustomization {
    /// Cloud-init variant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_init: Option<CloudInit>,
    /// Sysprep variant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sysprep: Option<Sysprep>,
}

/// VM compute, device and customization resources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VmResources {
    /// CPU socket count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_sockets: Option<u32>,
    /// Cores per socket
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_vcpus_per_socket: Option<u32>,
    /// Memory in MiB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_size_mib: Option<u64>,
    /// Desired power state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_state: Option<PowerState>,
    /// Mechanism for the power transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_state_mechanism: Option<PowerStateMechanism>,
    /// Ordered NIC list
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nic_list: Vec<NicSpec>,
    /// Ordered disk list
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disk_list: Vec<DiskSpec>,
    /// Guest customization blob
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_customization: Option<GuestCustomization>,
    /// Server-managed fields preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Writable VM spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmSpec {
    /// VM name
    pub name: String,
    /// Cluster the VM is placed on; immutable once set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_reference: Option<Reference>,
    /// Compute and device resources
    pub resources: VmResources,
    /// Server-managed fields preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Read-only VM status subtree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VmStatus {
    /// Reported name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Spec/actual convergence state (`COMPLETE`, `PENDING`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Actual resources, including reported IPs and actual power state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<VmResources>,
    /// Cluster the VM actually runs on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_reference: Option<Reference>,
    /// Task context attached to mutating responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_context: Option<ExecutionContext>,
    /// Anything else the server reports
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl VmStatus {
    /// Actual power state reported by the server.
    pub fn power_state(&self) -> Option<PowerState> {
        self.resources.as_ref().and_then(|r| r.power_state)
    }

    /// First assigned IP address on the first NIC, if any.
    pub fn first_ip(&self) -> Option<&str> {
        let nics = &self.resources.as_ref()?.nic_list;
        let endpoints = nics.first()?.ip_endpoint_list.as_ref()?;
        let ip = &endpoints.first()?.ip;
        if ip.is_empty() { None } else { Some(ip) }
    }
}

/// A VM entity envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmEntity {
    /// API version; `3.1.0` on payloads we build
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    /// Identity and version counters
    pub metadata: Metadata,
    /// Writable spec
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<VmSpec>,
    /// Read-only status; must be stripped before the entity is resubmitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<VmStatus>,
}

impl VmEntity {
    /// Drop the read-only status subtree so the entity is a valid write body.
    pub fn strip_status(&mut self) {
        self.status = None;
    }
}

/// Subnet IP address management configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IpConfig {
    /// Network address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_ip: Option<String>,
    /// Network prefix length
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_length: Option<u8>,
    /// Default gateway
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_gateway_ip: Option<String>,
    /// DHCP server address override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp_server_address: Option<DhcpServerAddress>,
    /// DHCP pool ranges
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_list: Option<Vec<DhcpPool>>,
    /// DHCP options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp_options: Option<DhcpOptions>,
}

/// DHCP server address override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DhcpServerAddress {
    /// Server IP
    pub ip: String,
}

/// One DHCP pool range, space separated (`10.0.0.10 10.0.0.30`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DhcpPool {
    /// The range string
    pub range: String,
}

/// DHCP options handed to guests.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DhcpOptions {
    /// DNS servers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name_server_list: Option<Vec<String>>,
    /// Search domain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
}

/// Subnet resources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubnetResources {
    /// `VLAN` or `OVERLAY`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_type: Option<String>,
    /// VLAN id; immutable once set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan_id: Option<i64>,
    /// Virtual switch carrying the subnet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_switch_uuid: Option<String>,
    /// Server-echoed switch name; dropped before resubmission
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vswitch_name: Option<String>,
    /// Whether the subnet is externally routable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_external: Option<bool>,
    /// IP address management configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_config: Option<IpConfig>,
    /// Server-managed fields preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Writable subnet spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubnetSpec {
    /// Subnet name
    pub name: String,
    /// Cluster the subnet is scoped to; immutable once set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_reference: Option<Reference>,
    /// Network resources
    pub resources: SubnetResources,
    /// Server-managed fields preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Read-only status subtree shared by subnets, images and clusters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityStatus {
    /// Reported name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Spec/actual convergence state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Task context attached to mutating responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_context: Option<ExecutionContext>,
    /// Anything else the server reports
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A subnet entity envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubnetEntity {
    /// API version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    /// Identity and version counters
    pub metadata: Metadata,
    /// Writable spec
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<SubnetSpec>,
    /// Read-only status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EntityStatus>,
}

impl SubnetEntity {
    /// Drop the read-only status subtree so the entity is a valid write body.
    pub fn strip_status(&mut self) {
        self.status = None;
    }
}

/// Image source options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceOptions {
    /// Allow fetching the source over an unverified TLS connection
    pub allow_insecure_connection: bool,
}

/// Image resources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageResources {
    /// `ISO_IMAGE` or `DISK_IMAGE`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
    /// URL the image is fetched from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
    /// Fetch options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_options: Option<SourceOptions>,
    /// Server-managed fields preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Writable image spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSpec {
    /// Image name
    pub name: String,
    /// Free-form description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Image source and type
    pub resources: ImageResources,
    /// Server-managed fields preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// An image entity envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageEntity {
    /// API version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    /// Identity and version counters
    pub metadata: Metadata,
    /// Writable spec
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<ImageSpec>,
    /// Read-only status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EntityStatus>,
}

impl ImageEntity {
    /// Drop the read-only status subtree so the entity is a valid write body.
    pub fn strip_status(&mut self) {
        self.status = None;
    }
}

/// A cluster entity envelope (read-only from this crate's perspective).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterEntity {
    /// API version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    /// Identity
    pub metadata: Metadata,
    /// Cluster spec, opaque to this crate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<Value>,
    /// Read-only status carrying the cluster name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EntityStatus>,
}

/// Task execution context attached to mutating responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Task driving the mutation to completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_uuid: Option<String>,
}

/// Response shape shared by create, update and delete calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResponse {
    /// Identity of the mutated entity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    /// Execution context carrying the task UUID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EntityStatus>,
}

impl MutationResponse {
    /// UUID of the mutated entity, if the response carries one.
    pub fn entity_uuid(&self) -> Option<&str> {
        self.metadata.as_ref()?.uuid.as_deref()
    }

    /// UUID of the task driving the mutation.
    pub fn task_uuid(&self) -> Option<&str> {
        self.status
            .as_ref()?
            .execution_context
            .as_ref()?
            .task_uuid
            .as_deref()
    }
}

/// Terminal and non-terminal task states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Accepted, not yet scheduled
    Queued,
    /// Scheduled, not yet running
    Pending,
    /// In progress
    Running,
    /// Terminal success
    Succeeded,
    /// Terminal failure
    Failed,
}

impl TaskStatus {
    /// Whether this state is terminal.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed)
    }
}

/// An asynchronous task returned by any mutating call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Task UUID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    /// Current state
    pub status: TaskStatus,
    /// Failure detail, populated on FAILED
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    /// Completion percentage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage_complete: Option<u8>,
}

/// Grouped-aggregation query body for the `/groups` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupsRequest {
    /// Entity type to aggregate over
    pub entity_type: String,
    /// FIQL filter applied before grouping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_criteria: Option<String>,
    /// Attributes projected per group member
    pub group_member_attributes: Vec<GroupAttribute>,
}

/// One projected attribute in a groups query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupAttribute {
    /// Attribute name
    pub attribute: String,
}

/// `/groups` response envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupsResponse {
    /// Result groups
    #[serde(default)]
    pub group_results: Vec<GroupResult>,
}

/// One group in a `/groups` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupResult {
    /// Member entities of the group
    #[serde(default)]
    pub entity_results: Vec<GroupEntityResult>,
}

/// One entity inside a group result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupEntityResult {
    /// UUID of the member entity
    #[serde(default)]
    pub entity_id: String,
    /// Projected attribute data
    #[serde(default)]
    pub data: Vec<GroupFieldData>,
}

/// Projected values for one attribute of one group member.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupFieldData {
    /// Attribute name
    #[serde(default)]
    pub name: String,
    /// Time-bucketed value sets; the first bucket holds current values
    #[serde(default)]
    pub values: Vec<GroupFieldValues>,
}

impl GroupFieldData {
    /// First current value for this attribute, if any.
    pub fn first_value(&self) -> Option<&str> {
        self.values.first()?.values.first().map(String::as_str)
    }
}

/// One time bucket of attribute values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupFieldValues {
    /// The values themselves
    #[serde(default)]
    pub values: Vec<String>,
}
