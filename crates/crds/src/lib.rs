//! IPAM claims resource definitions
//!
//! Kubernetes resource types read and written by the IPAM claims controller:
//! the network-facing subset of KubeVirt's `VirtualMachineInstance`, Multus
//! `NetworkAttachmentDefinition`s, `IPAMClaim`s and the Multus annotation
//! payloads.

pub mod virtual_machine_instance;
pub mod network_attachment_definition;
pub mod ipam_claim;
pub mod multus;

pub use virtual_machine_instance::*;
pub use network_attachment_definition::*;
pub use ipam_claim::*;
pub use multus::*;
