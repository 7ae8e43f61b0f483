//! Prism Central Controller
//!
//! Declarative reconciliation of Nutanix Prism Central resources:
//! - VMs: create, update, delete, power on/off
//! - Subnets: VLAN networks with optional managed IP configuration
//! - Images: disk and ISO images sourced from URIs
//!
//! Reads one operation document (JSON) from the first argument or stdin,
//! drives the observed state towards it, and prints the outcome as JSON.

mod builder;
mod config;
mod diff;
#[cfg(test)]
mod diff_test;
mod error;
mod params;
mod reconciler;
#[cfg(test)]
mod test_utils;

use crate::config::ConnectionConfig;
use crate::error::ControllerError;
use crate::params::Operation;
use crate::reconciler::{Outcome, Reconciler};
use prism_client::PrismClient;
use std::env;
use std::io::Read;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Prism Central controller");

    let config = ConnectionConfig::from_env()?;
    info!("Configuration:");
    info!("  Prism Central: {}:{}", config.hostname, config.port);
    info!("  Validate certs: {}", config.validate_certs);

    let operation = read_operation()?;

    let client = PrismClient::new(config.into())?;
    let reconciler = Reconciler::new(Arc::new(client));

    let outcome = match reconciler.run(&operation).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Reconciliation failed: {}", e);
            Outcome::failure(e.to_string())
        }
    };

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    if outcome.failed == Some(true) {
        std::process::exit(1);
    }
    Ok(())
}

/// Read the operation document from argv, or stdin when no argument is given.
fn read_operation() -> Result<Operation, ControllerError> {
    let document = match env::args().nth(1) {
        Some(arg) => arg,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    if document.trim().is_empty() {
        return Err(ControllerError::InvalidConfig(
            "no operation document given on argv or stdin".to_string(),
        ));
    }
    Ok(serde_json::from_str(&document)?)
}
