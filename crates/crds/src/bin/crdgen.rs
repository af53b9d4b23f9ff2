//! Prints the CRD manifests for the resources the controller depends on.
//!
//! Useful for dev clusters that do not carry the upstream Multus and
//! IPAMClaim manifests:
//!
//! ```sh
//! cargo run -p crds --bin crdgen | kubectl apply -f -
//! ```

use crds::{IPAMClaim, NetworkAttachmentDefinition};
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    let crds = [NetworkAttachmentDefinition::crd(), IPAMClaim::crd()];
    for crd in &crds {
        print!("---\n{}", serde_yaml::to_string(crd)?);
    }
    Ok(())
}
