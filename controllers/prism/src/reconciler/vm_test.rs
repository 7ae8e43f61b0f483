//! Unit tests for the VM reconciler

#[cfg(test)]
mod tests {
    use crate::error::ControllerError;
    use crate::params::{DiskParam, NicParam, RefParam, State, VmParams};
    use crate::reconciler::Reconciler;
    use crate::test_utils::*;
    use prism_client::{MockPrismClient, PollOptions, PowerState, PrismError};
    use std::sync::Arc;
    use std::time::Duration;

    const CLUSTER: &str = "d27d6bcf-3b3e-4a3f-9d5a-0c1f6a37f902";
    const OTHER_CLUSTER: &str = "8b2f12aa-64f0-4e6d-9f2e-5a7d8f3c1b44";

    fn reconciler(mock: &MockPrismClient) -> Reconciler {
        Reconciler::new(Arc::new(mock.clone()))
            .with_poll_options(PollOptions {
                interval: Duration::ZERO,
                max_attempts: 10,
                max_transport_errors: 5,
            })
            .with_ip_wait(1, Duration::ZERO)
    }

    fn base_params(name: &str) -> VmParams {
        VmParams {
            name: Some(name.to_string()),
            vm_uuid: None,
            cluster: None,
            cpu: Some(2),
            vcpu: Some(2),
            memory: Some(2048),
            disk_list: Vec::new(),
            nic_list: Vec::new(),
            guest_customization: None,
            state: State::Present,
            dry_run: false,
        }
    }

    fn exact_calls(mock: &MockPrismClient, entry: &str) -> usize {
        mock.journal().iter().filter(|e| *e == entry).count()
    }

    #[tokio::test]
    async fn create_vm_resolves_references_and_posts_once() {
        let mock = MockPrismClient::new();
        mock.add_image(MockPrismClient::image_fixture("img-1", "centos-image"));
        mock.add_subnet(MockPrismClient::subnet_fixture("subnet-10", "vlan.10"));

        let mut params = base_params("vm1");
        params.cluster = Some(CLUSTER.to_string());
        params.disk_list = vec![DiskParam {
            device_type: "DISK".to_string(),
            adapter_type: "SCSI".to_string(),
            size_mib: None,
            data_source: Some(RefParam {
                name: Some("centos-image".to_string()),
                uuid: None,
            }),
            storage_container: None,
        }];
        params.nic_list = vec![NicParam {
            subnet_reference: RefParam {
                name: Some("vlan.10".to_string()),
                uuid: None,
            },
            nic_type: None,
            vlan_mode: None,
            is_connected: None,
            num_queues: None,
        }];

        let outcome = reconciler(&mock).reconcile_vm(&params).await.unwrap();

        assert!(outcome.changed);
        assert!(outcome.vm_uuid.is_some());
        assert!(outcome.task_uuid.is_some());
        assert_eq!(exact_calls(&mock, "POST /vms"), 1);
        assert_eq!(exact_calls(&mock, "POST /images/list"), 1);
        assert_eq!(exact_calls(&mock, "POST /subnets/list"), 1);
    }

    #[tokio::test]
    async fn second_run_with_identical_input_is_idempotent() {
        let mock = MockPrismClient::new();
        let r = reconciler(&mock);
        let params = base_params("vm1");

        let first = r.reconcile_vm(&params).await.unwrap();
        assert!(first.changed);

        let second = r.reconcile_vm(&params).await.unwrap();
        assert!(!second.changed);
        // The no-op run issued no mutating call.
        assert_eq!(exact_calls(&mock, "POST /vms"), 1);
        assert_eq!(mock.calls_matching("PUT /vms"), 0);
    }

    #[tokio::test]
    async fn deleting_an_ambiguous_name_issues_no_delete() {
        let mock = MockPrismClient::new();
        mock.add_vm(MockPrismClient::vm_fixture("vm-1", "web"));
        mock.add_vm(MockPrismClient::vm_fixture("vm-2", "web"));

        let mut params = base_params("web");
        params.state = State::Absent;

        let err = reconciler(&mock).reconcile_vm(&params).await.unwrap_err();
        match err {
            ControllerError::Prism(PrismError::AmbiguousName { uuids, .. }) => {
                assert_eq!(uuids.len(), 2);
            }
            other => panic!("expected AmbiguousName, got {other}"),
        }
        assert_eq!(mock.calls_matching("DELETE /vms"), 0);
    }

    #[tokio::test]
    async fn cluster_change_conflicts_without_a_put() {
        let mock = MockPrismClient::new();
        mock.add_vm(observed_vm(
            "vm-1",
            "web-01",
            CLUSTER,
            Vec::new(),
            Vec::new(),
            PowerState::On,
        ));

        let mut params = base_params("web-01");
        params.cluster = Some(OTHER_CLUSTER.to_string());

        let err = reconciler(&mock).reconcile_vm(&params).await.unwrap_err();
        assert!(matches!(err, ControllerError::Conflict(_)));
        assert_eq!(mock.calls_matching("PUT /vms"), 0);
    }

    #[tokio::test]
    async fn shrinking_memory_powers_off_before_the_resize() {
        let mock = MockPrismClient::new();
        mock.add_vm(observed_vm(
            "vm-1",
            "web-01",
            CLUSTER,
            Vec::new(),
            Vec::new(),
            PowerState::On,
        ));

        let mut params = base_params("web-01");
        params.memory = Some(1024);

        let outcome = reconciler(&mock).reconcile_vm(&params).await.unwrap();
        assert!(outcome.changed);

        let history = mock.vm_update_history();
        assert_eq!(history.len(), 2);

        let interim = history[0].1.spec.as_ref().unwrap();
        assert_eq!(interim.resources.power_state, Some(PowerState::Off));
        assert_eq!(interim.resources.memory_size_mib, Some(2048));

        let resize = history[1].1.spec.as_ref().unwrap();
        assert_eq!(resize.resources.memory_size_mib, Some(1024));
        // The declared power state is re-asserted in the same update.
        assert_eq!(resize.resources.power_state, Some(PowerState::On));
        // Versions advanced past the interim write.
        assert_eq!(history[0].1.metadata.spec_version, Some(4));
        assert_eq!(history[1].1.metadata.spec_version, Some(5));
    }

    #[tokio::test]
    async fn growing_memory_does_not_power_cycle() {
        let mock = MockPrismClient::new();
        mock.add_vm(observed_vm(
            "vm-1",
            "web-01",
            CLUSTER,
            Vec::new(),
            Vec::new(),
            PowerState::On,
        ));

        let mut params = base_params("web-01");
        params.memory = Some(4096);

        let outcome = reconciler(&mock).reconcile_vm(&params).await.unwrap();
        assert!(outcome.changed);

        let history = mock.vm_update_history();
        assert_eq!(history.len(), 1);
        assert_eq!(
            history[0].1.spec.as_ref().unwrap().resources.power_state,
            Some(PowerState::On)
        );
    }

    #[tokio::test]
    async fn power_on_is_idempotent() {
        let mock = MockPrismClient::new();
        mock.add_vm(observed_vm(
            "vm-1",
            "web-01",
            CLUSTER,
            Vec::new(),
            Vec::new(),
            PowerState::Off,
        ));

        let mut params = base_params("web-01");
        params.state = State::Poweron;

        let first = reconciler(&mock).reconcile_vm(&params).await.unwrap();
        assert!(first.changed);
        let payload = &mock.vm_update_history()[0].1;
        assert_eq!(
            payload.spec.as_ref().unwrap().resources.power_state,
            Some(PowerState::On)
        );

        let second = reconciler(&mock).reconcile_vm(&params).await.unwrap();
        assert!(!second.changed);
        assert_eq!(mock.vm_update_history().len(), 1);
    }

    #[tokio::test]
    async fn observed_state_is_fetched_after_reference_resolution() {
        let mock = MockPrismClient::new();
        mock.add_image(MockPrismClient::image_fixture("img-a", "centos-image"));
        mock.add_vm(observed_vm(
            "vm-1",
            "web-01",
            CLUSTER,
            vec![observed_disk("d-0", "SCSI", 0, Some("img-a"))],
            Vec::new(),
            PowerState::On,
        ));

        let mut params = base_params("web-01");
        params.disk_list = vec![DiskParam {
            device_type: "DISK".to_string(),
            adapter_type: "SCSI".to_string(),
            size_mib: None,
            data_source: Some(RefParam {
                name: Some("centos-image".to_string()),
                uuid: None,
            }),
            storage_container: None,
        }];

        let outcome = reconciler(&mock).reconcile_vm(&params).await.unwrap();
        assert!(!outcome.changed);

        let journal = mock.journal();
        let resolved_at = journal
            .iter()
            .position(|e| e == "POST /images/list")
            .expect("image resolution call");
        let fetched_at = journal
            .iter()
            .position(|e| e == "GET /vms/vm-1")
            .expect("observed state fetch");
        assert!(resolved_at < fetched_at);
    }

    #[tokio::test]
    async fn dry_run_reports_the_payload_without_mutating() {
        let mock = MockPrismClient::new();
        let mut params = base_params("vm1");
        params.dry_run = true;

        let outcome = reconciler(&mock).reconcile_vm(&params).await.unwrap();
        assert!(outcome.changed);
        assert!(outcome.spec.is_some());
        assert_eq!(exact_calls(&mock, "POST /vms"), 0);
    }

    #[tokio::test]
    async fn deleting_a_missing_vm_is_a_no_op() {
        let mock = MockPrismClient::new();
        let mut params = base_params("ghost");
        params.state = State::Absent;

        let outcome = reconciler(&mock).reconcile_vm(&params).await.unwrap();
        assert!(!outcome.changed);
        assert_eq!(mock.calls_matching("DELETE /vms"), 0);
    }
}
