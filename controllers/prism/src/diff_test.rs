//! Unit tests for the desired-vs-observed diff engine.

#[cfg(test)]
mod tests {
    use crate::diff::{ReconcileState, diff_image, diff_subnet, diff_vm};
    use crate::test_utils::*;
    use prism_client::*;

    const CLUSTER: &str = "cluster-1";

    #[test]
    fn identical_specs_are_unchanged() {
        let observed = observed_vm(
            "vm-1",
            "web-01",
            CLUSTER,
            vec![observed_disk("d-0", "SCSI", 0, Some("img-a"))],
            vec![observed_nic("n-0", "subnet-1")],
            PowerState::On,
        );
        let desired = desired_vm(
            "web-01",
            Some(CLUSTER),
            vec![desired_disk("SCSI", 0, Some("img-a"))],
            vec![desired_nic("subnet-1")],
        );

        assert!(matches!(
            diff_vm(&desired, &observed),
            ReconcileState::Unchanged
        ));
    }

    #[test]
    fn changed_disk_targets_its_index_only() {
        // Observed [A,B], desired [A,C]: index 1 changes, index 0 keeps its
        // server-assigned UUID.
        let observed = observed_vm(
            "vm-1",
            "web-01",
            CLUSTER,
            vec![
                observed_disk("d-0", "SCSI", 0, Some("img-a")),
                observed_disk("d-1", "SCSI", 1, Some("img-b")),
            ],
            Vec::new(),
            PowerState::On,
        );
        let desired = desired_vm(
            "web-01",
            Some(CLUSTER),
            vec![
                desired_disk("SCSI", 0, Some("img-a")),
                desired_disk("SCSI", 1, Some("img-c")),
            ],
            Vec::new(),
        );

        match diff_vm(&desired, &observed) {
            ReconcileState::Changed {
                payload,
                requires_power_off,
            } => {
                assert!(!requires_power_off);
                let disks = &payload.spec.unwrap().resources.disk_list;
                assert_eq!(disks.len(), 2);
                assert_eq!(disks[0].uuid.as_deref(), Some("d-0"));
                assert_eq!(
                    disks[1]
                        .data_source_reference
                        .as_ref()
                        .unwrap()
                        .uuid
                        .as_deref(),
                    Some("img-c")
                );
                assert!(disks[1].uuid.is_none());
            }
            other => panic!("expected Changed, got {other:?}"),
        }
    }

    #[test]
    fn cluster_change_is_a_conflict() {
        let observed = observed_vm(
            "vm-1",
            "web-01",
            CLUSTER,
            Vec::new(),
            Vec::new(),
            PowerState::On,
        );
        let desired = desired_vm("web-01", Some("cluster-2"), Vec::new(), Vec::new());

        assert!(matches!(
            diff_vm(&desired, &observed),
            ReconcileState::Conflict(_)
        ));
    }

    #[test]
    fn memory_shrink_requires_power_off_and_growth_does_not() {
        let observed = observed_vm(
            "vm-1",
            "web-01",
            CLUSTER,
            Vec::new(),
            Vec::new(),
            PowerState::On,
        );

        let mut grow = desired_vm("web-01", Some(CLUSTER), Vec::new(), Vec::new());
        grow.spec.as_mut().unwrap().resources.memory_size_mib = Some(4096);
        match diff_vm(&grow, &observed) {
            ReconcileState::Changed {
                requires_power_off, ..
            } => assert!(!requires_power_off),
            other => panic!("expected Changed, got {other:?}"),
        }

        let mut shrink = desired_vm("web-01", Some(CLUSTER), Vec::new(), Vec::new());
        shrink.spec.as_mut().unwrap().resources.memory_size_mib = Some(1024);
        match diff_vm(&shrink, &observed) {
            ReconcileState::Changed {
                requires_power_off, ..
            } => assert!(requires_power_off),
            other => panic!("expected Changed, got {other:?}"),
        }
    }

    #[test]
    fn trailing_customization_cdrom_is_preserved() {
        let observed = observed_vm(
            "vm-1",
            "web-01",
            CLUSTER,
            vec![
                observed_disk("d-0", "SCSI", 0, Some("img-a")),
                observed_cdrom("cd-0"),
            ],
            Vec::new(),
            PowerState::On,
        );

        // Same declared disk: the extra CD-ROM slot is not a difference.
        let unchanged = desired_vm(
            "web-01",
            Some(CLUSTER),
            vec![desired_disk("SCSI", 0, Some("img-a"))],
            Vec::new(),
        );
        assert!(matches!(
            diff_vm(&unchanged, &observed),
            ReconcileState::Unchanged
        ));

        // Changed declared disk: the CD-ROM slot is re-appended after it.
        let mut resized = desired_vm(
            "web-01",
            Some(CLUSTER),
            vec![desired_disk("SCSI", 0, Some("img-a"))],
            Vec::new(),
        );
        resized.spec.as_mut().unwrap().resources.disk_list[0].disk_size_mib = Some(40_960);
        match diff_vm(&resized, &observed) {
            ReconcileState::Changed { payload, .. } => {
                let disks = &payload.spec.unwrap().resources.disk_list;
                assert_eq!(disks.len(), 2);
                assert_eq!(disks[0].disk_size_mib, Some(40_960));
                assert!(disks[1].is_cdrom());
                assert_eq!(disks[1].uuid.as_deref(), Some("cd-0"));
            }
            other => panic!("expected Changed, got {other:?}"),
        }
    }

    #[test]
    fn trailing_cdrom_survives_disk_list_growth() {
        let observed = observed_vm(
            "vm-1",
            "web-01",
            CLUSTER,
            vec![
                observed_disk("d-0", "SCSI", 0, Some("img-a")),
                observed_cdrom("cd-0"),
            ],
            Vec::new(),
            PowerState::On,
        );
        let desired = desired_vm(
            "web-01",
            Some(CLUSTER),
            vec![
                desired_disk("SCSI", 0, Some("img-a")),
                desired_disk("SCSI", 1, Some("img-b")),
            ],
            Vec::new(),
        );

        match diff_vm(&desired, &observed) {
            ReconcileState::Changed {
                payload,
                requires_power_off,
            } => {
                assert!(!requires_power_off);
                let disks = &payload.spec.unwrap().resources.disk_list;
                assert_eq!(disks.len(), 3);
                assert_eq!(disks[0].uuid.as_deref(), Some("d-0"));
                assert_eq!(
                    disks[1]
                        .data_source_reference
                        .as_ref()
                        .unwrap()
                        .uuid
                        .as_deref(),
                    Some("img-b")
                );
                assert!(disks[2].is_cdrom());
                assert_eq!(disks[2].uuid.as_deref(), Some("cd-0"));
            }
            other => panic!("expected Changed, got {other:?}"),
        }
    }

    #[test]
    fn trailing_cdrom_survives_disk_list_truncation() {
        let observed = observed_vm(
            "vm-1",
            "web-01",
            CLUSTER,
            vec![
                observed_disk("d-0", "SCSI", 0, Some("img-a")),
                observed_disk("d-1", "SCSI", 1, Some("img-b")),
                observed_cdrom("cd-0"),
            ],
            Vec::new(),
            PowerState::On,
        );
        let desired = desired_vm(
            "web-01",
            Some(CLUSTER),
            vec![desired_disk("SCSI", 0, Some("img-a"))],
            Vec::new(),
        );

        match diff_vm(&desired, &observed) {
            ReconcileState::Changed {
                payload,
                requires_power_off,
            } => {
                assert!(requires_power_off);
                let disks = &payload.spec.unwrap().resources.disk_list;
                assert_eq!(disks.len(), 2);
                assert_eq!(disks[0].uuid.as_deref(), Some("d-0"));
                assert!(disks[1].is_cdrom());
                assert_eq!(disks[1].uuid.as_deref(), Some("cd-0"));
            }
            other => panic!("expected Changed, got {other:?}"),
        }
    }

    #[test]
    fn declared_trailing_cdrom_compares_positionally() {
        // A CD-ROM the caller declared is their own device, not the
        // server-injected slot, and must not be duplicated by the merge.
        let observed = observed_vm(
            "vm-1",
            "web-01",
            CLUSTER,
            vec![
                observed_disk("d-0", "SCSI", 0, Some("img-a")),
                observed_cdrom("cd-0"),
            ],
            Vec::new(),
            PowerState::On,
        );
        let mut declared_cdrom = observed_cdrom("cd-0");
        declared_cdrom.uuid = None;
        let desired = desired_vm(
            "web-01",
            Some(CLUSTER),
            vec![desired_disk("SCSI", 0, Some("img-a")), declared_cdrom],
            Vec::new(),
        );

        assert!(matches!(
            diff_vm(&desired, &observed),
            ReconcileState::Unchanged
        ));
    }

    #[test]
    fn nic_truncation_requires_power_off() {
        let observed = observed_vm(
            "vm-1",
            "web-01",
            CLUSTER,
            Vec::new(),
            vec![
                observed_nic("n-0", "subnet-1"),
                observed_nic("n-1", "subnet-2"),
            ],
            PowerState::On,
        );
        let desired = desired_vm(
            "web-01",
            Some(CLUSTER),
            Vec::new(),
            vec![desired_nic("subnet-1")],
        );

        match diff_vm(&desired, &observed) {
            ReconcileState::Changed {
                payload,
                requires_power_off,
            } => {
                assert!(requires_power_off);
                let nics = &payload.spec.unwrap().resources.nic_list;
                assert_eq!(nics.len(), 1);
                assert_eq!(nics[0].uuid.as_deref(), Some("n-0"));
            }
            other => panic!("expected Changed, got {other:?}"),
        }
    }

    #[test]
    fn update_payload_bumps_spec_version_and_strips_status() {
        let observed = observed_vm(
            "vm-1",
            "web-01",
            CLUSTER,
            Vec::new(),
            Vec::new(),
            PowerState::On,
        );
        let mut desired = desired_vm("web-01", Some(CLUSTER), Vec::new(), Vec::new());
        desired.spec.as_mut().unwrap().resources.memory_size_mib = Some(4096);

        match diff_vm(&desired, &observed) {
            ReconcileState::Changed { payload, .. } => {
                assert_eq!(payload.metadata.spec_version, Some(4));
                assert!(payload.status.is_none());
            }
            other => panic!("expected Changed, got {other:?}"),
        }
    }

    #[test]
    fn subnet_vlan_change_is_a_conflict() {
        let observed = observed_subnet("subnet-1", "vlan.10", CLUSTER, 10, "vs-1");
        let mut desired = observed_subnet("", "vlan.10", CLUSTER, 20, "vs-1");
        desired.metadata.uuid = None;

        assert!(matches!(
            diff_subnet(&desired, &observed, false),
            ReconcileState::Conflict(_)
        ));
    }

    #[test]
    fn undeclared_ip_config_is_left_alone() {
        let mut observed = observed_subnet("subnet-1", "vlan.10", CLUSTER, 10, "vs-1");
        observed
            .spec
            .as_mut()
            .unwrap()
            .resources
            .ip_config = Some(IpConfig {
            subnet_ip: Some("10.0.0.0".to_string()),
            prefix_length: Some(24),
            ..IpConfig::default()
        });
        let desired = observed_subnet("", "vlan.10", CLUSTER, 10, "vs-1");

        assert!(matches!(
            diff_subnet(&desired, &observed, false),
            ReconcileState::Unchanged
        ));

        // Declaring an empty block clears the existing configuration.
        let mut cleared = desired.clone();
        cleared.spec.as_mut().unwrap().resources.ip_config = None;
        match diff_subnet(&cleared, &observed, true) {
            ReconcileState::Changed { payload, .. } => {
                let resources = &payload.spec.unwrap().resources;
                assert!(resources.ip_config.is_none());
                assert!(resources.vswitch_name.is_none());
            }
            other => panic!("expected Changed, got {other:?}"),
        }
    }

    #[test]
    fn image_rename_produces_an_update() {
        let observed = MockPrismClient::image_fixture("img-1", "centos-7");
        match diff_image(&observed, None, Some("centos-7-base"), None) {
            ReconcileState::Changed { payload, .. } => {
                assert_eq!(payload.spec.unwrap().name, "centos-7-base");
            }
            other => panic!("expected Changed, got {other:?}"),
        }
    }

    #[test]
    fn image_source_change_is_a_conflict() {
        let mut observed = MockPrismClient::image_fixture("img-1", "centos-7");
        observed.spec.as_mut().unwrap().resources.source_uri =
            Some("http://repo/centos7.qcow2".to_string());

        assert!(matches!(
            diff_image(&observed, Some("http://repo/centos8.qcow2"), None, None),
            ReconcileState::Conflict(_)
        ));
    }
}
