//! Cluster access for the MCP server.
//!
//! A single [`VirtClient`] wraps a `kube::Client` and hands out typed `Api`
//! handles for the KubeVirt and CDI resources, plus raw access to the
//! `subresources.kubevirt.io` endpoints that have no typed representation.

use http::Request;
use kube::api::{Api, ApiResource, DynamicObject};
use kube::core::GroupVersionKind;
use kube::{Client, Config};

use crate::apis::{
    DataVolume, VirtualMachine, VirtualMachineClusterInstancetype,
    VirtualMachineClusterPreference, VirtualMachineInstance, VirtualMachineInstancetype,
    VirtualMachinePreference,
};
use crate::error::{KubeVirtError, Result};

const SUBRESOURCE_API: &str = "/apis/subresources.kubevirt.io/v1";

/// Shared handle to the cluster, cheap to clone.
#[derive(Clone)]
pub struct VirtClient {
    client: Client,
}

impl VirtClient {
    /// Connect using the ambient configuration: in-cluster service account
    /// when present, otherwise the local kubeconfig.
    pub async fn connect() -> Result<Self> {
        let config = Config::infer().await?;
        let client = Client::try_from(config)?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn vms(&self, namespace: &str) -> Api<VirtualMachine> {
        Api::namespaced(self.client.clone(), namespace)
    }

    pub fn vmis(&self, namespace: &str) -> Api<VirtualMachineInstance> {
        Api::namespaced(self.client.clone(), namespace)
    }

    pub fn datavolumes(&self, namespace: &str) -> Api<DataVolume> {
        Api::namespaced(self.client.clone(), namespace)
    }

    pub fn instancetypes(&self, namespace: &str) -> Api<VirtualMachineInstancetype> {
        Api::namespaced(self.client.clone(), namespace)
    }

    pub fn preferences(&self, namespace: &str) -> Api<VirtualMachinePreference> {
        Api::namespaced(self.client.clone(), namespace)
    }

    pub fn cluster_instancetypes(&self) -> Api<VirtualMachineClusterInstancetype> {
        Api::all(self.client.clone())
    }

    pub fn cluster_preferences(&self) -> Api<VirtualMachineClusterPreference> {
        Api::all(self.client.clone())
    }

    /// Dynamic handle for fetching a namespaced object verbatim, without the
    /// field loss a partial typed struct would introduce.
    pub fn dynamic(&self, namespace: &str, gvk: &GroupVersionKind) -> Api<DynamicObject> {
        let resource = ApiResource::from_gvk(gvk);
        Api::namespaced_with(self.client.clone(), namespace, &resource)
    }

    /// Dynamic handle for cluster-scoped objects.
    pub fn dynamic_cluster(&self, gvk: &GroupVersionKind) -> Api<DynamicObject> {
        let resource = ApiResource::from_gvk(gvk);
        Api::all_with(self.client.clone(), &resource)
    }

    /// Issue the `pause` subresource request against a running VMI.
    pub async fn pause_vmi(&self, namespace: &str, name: &str) -> Result<()> {
        self.vmi_subresource_put(namespace, name, "pause")
            .await
            .map_err(|err| match err {
                KubeVirtError::Kube(e) => KubeVirtError::Pause(e),
                other => other,
            })
    }

    /// Issue the `unpause` subresource request against a paused VMI.
    pub async fn unpause_vmi(&self, namespace: &str, name: &str) -> Result<()> {
        self.vmi_subresource_put(namespace, name, "unpause")
            .await
            .map_err(|err| match err {
                KubeVirtError::Kube(e) => KubeVirtError::Unpause(e),
                other => other,
            })
    }

    /// Read a guest-agent subresource (`guestosinfo`, `filesystemlist`,
    /// `userlist`) as raw JSON.
    pub async fn vmi_subresource_get(
        &self,
        namespace: &str,
        name: &str,
        action: &str,
    ) -> Result<serde_json::Value> {
        let path = subresource_path(namespace, name, action);
        let request = Request::get(path).body(Vec::new())?;
        let body = self.client.request_text(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn vmi_subresource_put(&self, namespace: &str, name: &str, action: &str) -> Result<()> {
        let path = subresource_path(namespace, name, action);
        let request = Request::put(path).body(Vec::new())?;
        self.client.request_text(request).await?;
        Ok(())
    }
}

fn subresource_path(namespace: &str, name: &str, action: &str) -> String {
    format!("{SUBRESOURCE_API}/namespaces/{namespace}/virtualmachineinstances/{name}/{action}")
}
