//! Cluster instancetype tools.

use kube::api::ListParams;
use serde_json::json;

use kubevirt_mcp_core::{Result, VirtClient};

use crate::required;

/// List the names of all cluster instancetypes, one per line.
pub async fn list(client: &VirtClient) -> Result<String> {
    let instancetypes = client
        .cluster_instancetypes()
        .list(&ListParams::default())
        .await?;

    let mut names = String::new();
    for instancetype in instancetypes.items {
        if let Some(name) = instancetype.metadata.name {
            names.push_str(&name);
            names.push('\n');
        }
    }
    Ok(names)
}

/// Fetch a cluster instancetype and report its metadata and spec.
pub async fn get(client: &VirtClient, name: &str) -> Result<String> {
    let name = required(name, "name")?;

    let instancetype = client.cluster_instancetypes().get(name).await?;
    let result = json!({
        "name": instancetype.metadata.name,
        "labels": instancetype.metadata.labels,
        "annotations": instancetype.metadata.annotations,
        "spec": instancetype.spec,
    });
    Ok(serde_json::to_string_pretty(&result)?)
}
