//! Prism Central v3 API Client
//!
//! A Rust client library for the Nutanix Prism Central v3 REST API.
//! Provides type-safe entity envelopes and methods for VM, subnet and
//! image management.
//!
//! # Example
//!
//! ```no_run
//! use prism_client::{PrismApi, PrismClient, PrismConfig, EntityKind, resolve};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Create a client
//! let client = PrismClient::new(PrismConfig {
//!     hostname: "prism.example.com".to_string(),
//!     username: "admin".to_string(),
//!     password: "secret".to_string(),
//!     port: 9440,
//!     validate_certs: true,
//! })?;
//!
//! // Resolve a VM name to its UUID
//! let uuid = resolve::resolve(&client, EntityKind::Vm, "web-01").await?;
//!
//! // Read the full entity envelope
//! let vm = client.get_vm(&uuid).await?;
//! println!("power state: {:?}", vm.status.and_then(|s| s.power_state()));
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Entity envelopes**: metadata/spec/status shapes that preserve
//!   server-managed fields across read-modify-write cycles
//! - **Name resolution**: UUID-or-name lookup with duplicate detection
//! - **Pagination**: offset-driven draining of `/list` endpoints
//! - **Task Polling**: bounded polling of asynchronous mutation tasks

pub mod client;
pub mod error;
pub mod models;
pub mod pagination;
#[path = "trait.rs"]
pub mod prism_trait;
pub mod resolve;
pub mod task;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::{PrismClient, PrismConfig};
pub use error::PrismError;
pub use models::*;
pub use pagination::{ListMetadata, ListRequest, ListResponse};
pub use prism_trait::PrismApi;
pub use task::{poll_task, PollOptions};
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockPrismClient;
