//! Kubernetes network client
//!
//! Typed access to the handful of Kubernetes calls the IPAM claims controller
//! needs: NetworkAttachmentDefinition lookups, IPAMClaim create/get and VMI
//! annotation patches.
//!
//! # Example
//!
//! ```no_run
//! use network_client::{KubeNetworkClient, NetworkClientTrait};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = KubeNetworkClient::new(kube::Client::try_default().await?);
//! let nad = client.get_network_attachment_definition("default", "red-net").await?;
//! println!("{}", nad.spec.config);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
#[path = "trait.rs"]
pub mod netclient_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::KubeNetworkClient;
pub use error::NetworkClientError;
pub use netclient_trait::NetworkClientTrait;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockNetworkClient;
