//! Integration tests for the Prism Central client
//!
//! These tests require a reachable Prism Central instance.
//! Set PC_HOSTNAME, PC_USERNAME and PC_PASSWORD environment variables to run.

use prism_client::pagination;
use prism_client::{PrismClient, PrismConfig};

fn config_from_env() -> PrismConfig {
    PrismConfig {
        hostname: std::env::var("PC_HOSTNAME")
            .expect("PC_HOSTNAME environment variable must be set"),
        username: std::env::var("PC_USERNAME")
            .expect("PC_USERNAME environment variable must be set"),
        password: std::env::var("PC_PASSWORD")
            .expect("PC_PASSWORD environment variable must be set"),
        port: std::env::var("PC_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(9440),
        validate_certs: false,
    }
}

#[tokio::test]
#[ignore] // Requires running Prism Central instance
async fn test_client_connectivity() {
    let client = PrismClient::new(config_from_env()).expect("Failed to create client");

    client
        .validate_connection()
        .await
        .expect("Failed to reach Prism Central");
}

#[tokio::test]
#[ignore]
async fn test_list_clusters() {
    let client = PrismClient::new(config_from_env()).expect("Failed to create client");

    let clusters = pagination::list_all_clusters(&client, None)
        .await
        .expect("Failed to list clusters");

    println!("Found {} clusters", clusters.len());
    assert!(!clusters.is_empty(), "Expected at least one cluster");
}

#[tokio::test]
#[ignore]
async fn test_list_vms() {
    let client = PrismClient::new(config_from_env()).expect("Failed to create client");

    let vms = pagination::list_all_vms(&client, None)
        .await
        .expect("Failed to list VMs");

    println!("Found {} VMs", vms.len());
}

#[tokio::test]
#[ignore]
async fn test_list_subnets() {
    let client = PrismClient::new(config_from_env()).expect("Failed to create client");

    let subnets = pagination::list_all_subnets(&client, None)
        .await
        .expect("Failed to list subnets");

    println!("Found {} subnets", subnets.len());
}
