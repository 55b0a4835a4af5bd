//! Cluster preference tools.

use kube::api::ListParams;
use serde_json::json;

use kubevirt_mcp_core::{Result, VirtClient};

use crate::required;

/// List the names of all cluster preferences, one per line.
pub async fn list(client: &VirtClient) -> Result<String> {
    let preferences = client
        .cluster_preferences()
        .list(&ListParams::default())
        .await?;

    let mut names = String::new();
    for preference in preferences.items {
        if let Some(name) = preference.metadata.name {
            names.push_str(&name);
            names.push('\n');
        }
    }
    Ok(names)
}

/// Fetch a cluster preference and report its metadata and spec.
pub async fn get(client: &VirtClient, name: &str) -> Result<String> {
    let name = required(name, "name")?;

    let preference = client.cluster_preferences().get(name).await?;
    let result = json!({
        "name": preference.metadata.name,
        "labels": preference.metadata.labels,
        "annotations": preference.metadata.annotations,
        "spec": preference.spec,
    });
    Ok(serde_json::to_string_pretty(&result)?)
}
