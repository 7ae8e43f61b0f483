//! Desired-vs-observed diffing.
//!
//! Compares a freshly built desired payload against the observed entity and
//! produces the minimal update payload, or decides that nothing needs to be
//! sent. List fields compare positionally: index order determines which
//! physical disk or NIC a change applies to, so `[A,B]` vs `[A,C]` touches
//! index 1 only and index 0 keeps its server-assigned UUID.
//!
//! Fields a caller did not declare (a `None` in the desired payload) keep
//! their observed value. Immutable fields (cluster reference, subnet VLAN id)
//! produce a conflict instead of an update, and no request is sent.

use prism_client::*;
use tracing::debug;

/// Outcome of diffing a desired payload against an observed entity.
#[derive(Debug)]
pub enum ReconcileState<T> {
    /// Observed state already matches; no API call needed.
    Unchanged,
    /// An update is needed; `payload` is the merged write body.
    Changed {
        /// Merged payload: observed entity with changed fields replaced,
        /// status stripped, spec_version bumped.
        payload: T,
        /// The change shrinks the VM's allocation and needs a power-off first.
        requires_power_off: bool,
    },
    /// The declared change targets an immutable field.
    Conflict(String),
}

fn reference_uuid(r: Option<&Reference>) -> Option<&str> {
    r.and_then(|r| r.uuid.as_deref())
}

fn disk_source_uuid(disk: &DiskSpec) -> Option<&str> {
    reference_uuid(disk.data_source_reference.as_ref())
}

fn disk_container_uuid(disk: &DiskSpec) -> Option<&str> {
    disk.storage_config
        .as_ref()
        .and_then(|c| c.storage_container_reference.uuid.as_deref())
}

// A present key compared against a missing key counts as a difference.
fn disk_changed(desired: &DiskSpec, observed: &DiskSpec) -> bool {
    if disk_source_uuid(desired) != disk_source_uuid(observed) {
        return true;
    }
    if desired.device_properties != observed.device_properties {
        return true;
    }
    if let Some(size) = desired.disk_size_mib
        && observed.disk_size_mib != Some(size)
    {
        return true;
    }
    if desired.storage_config.is_some()
        && disk_container_uuid(desired) != disk_container_uuid(observed)
    {
        return true;
    }
    false
}

fn nic_changed(desired: &NicSpec, observed: &NicSpec) -> bool {
    if desired.subnet_reference.uuid != observed.subnet_reference.uuid {
        return true;
    }
    if desired.nic_type.is_some() && desired.nic_type != observed.nic_type {
        return true;
    }
    if desired.vlan_mode.is_some() && desired.vlan_mode != observed.vlan_mode {
        return true;
    }
    if desired.is_connected.is_some() && desired.is_connected != observed.is_connected {
        return true;
    }
    if desired.num_queues.is_some() && desired.num_queues != observed.num_queues {
        return true;
    }
    false
}

/// Positionally merge a desired list into an observed list.
///
/// Unchanged positions keep the observed entry (preserving server-assigned
/// sub-fields), changed positions take the desired entry, extra trailing
/// desired entries are appended, and a shorter desired list truncates the
/// observed one. Returns `(merged, changed, truncated)`.
fn merge_positional<T: Clone>(
    desired: &[T],
    observed: &[T],
    entry_changed: impl Fn(&T, &T) -> bool,
) -> (Vec<T>, bool, bool) {
    let mut merged = Vec::with_capacity(desired.len());
    let mut changed = false;

    for (index, wanted) in desired.iter().enumerate() {
        match observed.get(index) {
            Some(current) if !entry_changed(wanted, current) => merged.push(current.clone()),
            Some(_) => {
                merged.push(wanted.clone());
                changed = true;
            }
            None => {
                merged.push(wanted.clone());
                changed = true;
            }
        }
    }

    let truncated = desired.len() < observed.len();
    if truncated {
        changed = true;
    }
    (merged, changed, truncated)
}

fn shrinks<T: PartialOrd>(desired: Option<T>, observed: Option<T>) -> bool {
    matches!((desired, observed), (Some(d), Some(o)) if d < o)
}

/// Diff a desired VM payload against the observed entity.
///
/// `desired` is a freshly built create-shaped payload; `observed` is the
/// entity as last fetched. The merged payload starts from the observed entity
/// so server-managed fields survive the round trip.
pub fn diff_vm(desired: &VmEntity, observed: &VmEntity) -> ReconcileState<VmEntity> {
    let Some(desired_spec) = desired.spec.as_ref() else {
        return ReconcileState::Unchanged;
    };
    let Some(observed_spec) = observed.spec.as_ref() else {
        return ReconcileState::Changed {
            payload: desired.clone(),
            requires_power_off: false,
        };
    };

    // Cluster placement is immutable once set.
    if let (Some(wanted), Some(current)) = (
        reference_uuid(desired_spec.cluster_reference.as_ref()),
        reference_uuid(observed_spec.cluster_reference.as_ref()),
    ) && wanted != current
    {
        return ReconcileState::Conflict(format!(
            "cluster reference cannot change after creation ('{current}' -> '{wanted}')"
        ));
    }

    let mut merged = observed.clone();
    merged.strip_status();
    let Some(merged_spec) = merged.spec.as_mut() else {
        return ReconcileState::Unchanged;
    };
    let mut changed = false;
    let mut requires_power_off = false;

    if desired_spec.name != observed_spec.name {
        merged_spec.name = desired_spec.name.clone();
        changed = true;
    }

    let wanted = &desired_spec.resources;
    let current = &observed_spec.resources;
    let resources = &mut merged_spec.resources;

    if wanted.num_sockets.is_some() && wanted.num_sockets != current.num_sockets {
        requires_power_off |= shrinks(wanted.num_sockets, current.num_sockets);
        resources.num_sockets = wanted.num_sockets;
        changed = true;
    }
    if wanted.num_vcpus_per_socket.is_some()
        && wanted.num_vcpus_per_socket != current.num_vcpus_per_socket
    {
        requires_power_off |= shrinks(wanted.num_vcpus_per_socket, current.num_vcpus_per_socket);
        resources.num_vcpus_per_socket = wanted.num_vcpus_per_socket;
        changed = true;
    }
    if wanted.memory_size_mib.is_some() && wanted.memory_size_mib != current.memory_size_mib {
        requires_power_off |= shrinks(wanted.memory_size_mib, current.memory_size_mib);
        resources.memory_size_mib = wanted.memory_size_mib;
        changed = true;
    }
    if wanted.guest_customization.is_some()
        && wanted.guest_customization != current.guest_customization
    {
        resources.guest_customization = wanted.guest_customization.clone();
        changed = true;
    }

    // The server injects a trailing CD-ROM slot for guest customization; it
    // is not part of the declared list and must survive the merge whether
    // the declared list grows, shrinks, or keeps its length. A declared
    // trailing CD-ROM is the caller's own device and compares positionally.
    let mut observed_disks = current.disk_list.clone();
    let declared_trailing_cdrom = wanted.disk_list.last().is_some_and(DiskSpec::is_cdrom);
    let trailing_cdrom = if !declared_trailing_cdrom
        && observed_disks.last().is_some_and(DiskSpec::is_cdrom)
    {
        observed_disks.pop()
    } else {
        None
    };

    let (mut merged_disks, disks_changed, disks_truncated) =
        merge_positional(&wanted.disk_list, &observed_disks, disk_changed);
    if let Some(cdrom) = trailing_cdrom {
        merged_disks.push(cdrom);
    }
    if disks_changed {
        resources.disk_list = merged_disks;
        changed = true;
    }
    requires_power_off |= disks_truncated;

    let (merged_nics, nics_changed, nics_truncated) =
        merge_positional(&wanted.nic_list, &current.nic_list, nic_changed);
    if nics_changed {
        resources.nic_list = merged_nics;
        changed = true;
    }
    requires_power_off |= nics_truncated;

    if let Some(power) = wanted.power_state
        && current.power_state != Some(power)
    {
        resources.power_state = Some(power);
        resources.power_state_mechanism = Some(PowerStateMechanism::hard());
        changed = true;
    }

    if !changed {
        return ReconcileState::Unchanged;
    }

    merged.metadata.bump_spec_version();
    debug!(
        vm = merged_spec_name(&merged),
        requires_power_off, "VM diff produced an update payload"
    );
    ReconcileState::Changed {
        payload: merged,
        requires_power_off,
    }
}

fn merged_spec_name(vm: &VmEntity) -> &str {
    vm.spec.as_ref().map_or("", |s| s.name.as_str())
}

/// Diff a desired subnet payload against the observed entity.
///
/// `ip_config_declared` says whether the caller declared an `ip_config`
/// block at all; without it the observed configuration is left alone.
pub fn diff_subnet(
    desired: &SubnetEntity,
    observed: &SubnetEntity,
    ip_config_declared: bool,
) -> ReconcileState<SubnetEntity> {
    let Some(desired_spec) = desired.spec.as_ref() else {
        return ReconcileState::Unchanged;
    };
    let Some(observed_spec) = observed.spec.as_ref() else {
        return ReconcileState::Changed {
            payload: desired.clone(),
            requires_power_off: false,
        };
    };

    if let (Some(wanted), Some(current)) = (
        desired_spec.resources.vlan_id,
        observed_spec.resources.vlan_id,
    ) && wanted != current
    {
        return ReconcileState::Conflict(format!(
            "vlan_id cannot change after creation ({current} -> {wanted})"
        ));
    }
    if let (Some(wanted), Some(current)) = (
        reference_uuid(desired_spec.cluster_reference.as_ref()),
        reference_uuid(observed_spec.cluster_reference.as_ref()),
    ) && wanted != current
    {
        return ReconcileState::Conflict(format!(
            "cluster reference cannot change after creation ('{current}' -> '{wanted}')"
        ));
    }

    let mut merged = observed.clone();
    merged.strip_status();
    let Some(merged_spec) = merged.spec.as_mut() else {
        return ReconcileState::Unchanged;
    };
    let mut changed = false;

    if desired_spec.name != observed_spec.name {
        merged_spec.name = desired_spec.name.clone();
        changed = true;
    }

    let wanted = &desired_spec.resources;
    let current = &observed_spec.resources;
    let resources = &mut merged_spec.resources;

    if wanted.virtual_switch_uuid.is_some()
        && wanted.virtual_switch_uuid != current.virtual_switch_uuid
    {
        resources.virtual_switch_uuid = wanted.virtual_switch_uuid.clone();
        changed = true;
    }

    if ip_config_declared && wanted.ip_config != current.ip_config {
        resources.ip_config = wanted.ip_config.clone();
        changed = true;
    }

    if !changed {
        return ReconcileState::Unchanged;
    }

    // The server echoes the switch name in reads but rejects it on writes.
    resources.vswitch_name = None;
    merged.metadata.bump_spec_version();
    ReconcileState::Changed {
        payload: merged,
        requires_power_off: false,
    }
}

/// Diff the declared rename/retype against the observed image.
///
/// The image source is immutable: replacing content means creating a new
/// image, so a declared `source_uri` that differs is a conflict.
pub fn diff_image(
    observed: &ImageEntity,
    declared_source: Option<&str>,
    new_name: Option<&str>,
    new_type: Option<&str>,
) -> ReconcileState<ImageEntity> {
    let Some(observed_spec) = observed.spec.as_ref() else {
        return ReconcileState::Unchanged;
    };

    if let (Some(wanted), Some(current)) = (
        declared_source,
        observed_spec.resources.source_uri.as_deref(),
    ) && wanted != current
    {
        return ReconcileState::Conflict(format!(
            "image source cannot change after creation ('{current}' -> '{wanted}'); \
             create a new image instead"
        ));
    }

    let mut merged = observed.clone();
    merged.strip_status();
    let Some(merged_spec) = merged.spec.as_mut() else {
        return ReconcileState::Unchanged;
    };
    let mut changed = false;

    if let Some(name) = new_name
        && merged_spec.name != name
    {
        merged_spec.name = name.to_string();
        changed = true;
    }
    if let Some(image_type) = new_type
        && merged_spec.resources.image_type.as_deref() != Some(image_type)
    {
        merged_spec.resources.image_type = Some(image_type.to_string());
        changed = true;
    }

    if !changed {
        return ReconcileState::Unchanged;
    }

    merged.metadata.bump_spec_version();
    ReconcileState::Changed {
        payload: merged,
        requires_power_off: false,
    }
}
