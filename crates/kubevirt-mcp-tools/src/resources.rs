//! Resource read handlers.
//!
//! Every `kubevirt://` URI resolves through [`ResourceAddress`] and renders
//! to pretty-printed JSON. List endpoints project summaries, single-object
//! endpoints return the cluster object verbatim via a dynamic fetch so no
//! field is lost to a partial typed struct.

use kube::api::ListParams;
use kube::core::GroupVersionKind;
use serde_json::{json, Map, Value};
use tracing::debug;

use kubevirt_mcp_core::apis::{DataVolume, VirtualMachine, VirtualMachineInstance};
use kubevirt_mcp_core::{KubeVirtError, ResourceAddress, Result, VirtClient};

fn kubevirt_gvk(kind: &str) -> GroupVersionKind {
    GroupVersionKind::gvk("kubevirt.io", "v1", kind)
}

fn instancetype_gvk(kind: &str) -> GroupVersionKind {
    GroupVersionKind::gvk("instancetype.kubevirt.io", "v1beta1", kind)
}

fn cdi_gvk(kind: &str) -> GroupVersionKind {
    GroupVersionKind::gvk("cdi.kubevirt.io", "v1beta1", kind)
}

/// Read the resource a URI addresses and render it as JSON text.
pub async fn read(client: &VirtClient, uri: &str) -> Result<String> {
    let address = ResourceAddress::parse(uri)?;
    debug!(uri, "reading resource");

    match address {
        ResourceAddress::VmList { namespace } => {
            let vms = client.vms(&namespace).list(&ListParams::default()).await?;
            let summaries: Vec<Value> = vms.items.iter().map(vm_summary).collect();
            pretty(&summaries)
        }
        ResourceAddress::Vm { namespace, name } => {
            let vm = client
                .dynamic(&namespace, &kubevirt_gvk("VirtualMachine"))
                .get(&name)
                .await?;
            pretty(&vm)
        }
        ResourceAddress::VmStatus { namespace, name } => {
            let vm = client.vms(&namespace).get(&name).await?;
            pretty(&vm_status_detail(&vm))
        }
        ResourceAddress::VmConsole { namespace, name } => {
            let vmi = match client.vmis(&namespace).get(&name).await {
                Ok(vmi) => Some(vmi),
                Err(kube::Error::Api(response)) if response.code == 404 => None,
                Err(err) => return Err(err.into()),
            };
            pretty(&console_info(&namespace, &name, vmi.as_ref()))
        }
        ResourceAddress::VmiList { namespace } => {
            let vmis = client.vmis(&namespace).list(&ListParams::default()).await?;
            let summaries: Vec<Value> = vmis.items.iter().map(vmi_summary).collect();
            pretty(&summaries)
        }
        ResourceAddress::Vmi { namespace, name } => {
            let vmi = client
                .dynamic(&namespace, &kubevirt_gvk("VirtualMachineInstance"))
                .get(&name)
                .await?;
            pretty(&vmi)
        }
        ResourceAddress::VmiGuestOsInfo { namespace, name } => {
            let info = client
                .vmi_subresource_get(&namespace, &name, "guestosinfo")
                .await?;
            pretty(&info)
        }
        ResourceAddress::VmiFilesystems { namespace, name } => {
            let filesystems = client
                .vmi_subresource_get(&namespace, &name, "filesystemlist")
                .await?;
            pretty(&filesystems)
        }
        ResourceAddress::VmiUserList { namespace, name } => {
            let users = client
                .vmi_subresource_get(&namespace, &name, "userlist")
                .await?;
            pretty(&users)
        }
        ResourceAddress::DataVolumeList { namespace } => {
            let dvs = client
                .datavolumes(&namespace)
                .list(&ListParams::default())
                .await?;
            let summaries: Vec<Value> = dvs.items.iter().map(datavolume_summary).collect();
            pretty(&summaries)
        }
        ResourceAddress::DataVolume { namespace, name } => {
            let dv = client
                .dynamic(&namespace, &cdi_gvk("DataVolume"))
                .get(&name)
                .await?;
            pretty(&dv)
        }
        ResourceAddress::InstancetypeList { namespace } => {
            let items = client
                .instancetypes(&namespace)
                .list(&ListParams::default())
                .await?;
            let names: Vec<String> =
                items.items.into_iter().filter_map(|it| it.metadata.name).collect();
            pretty(&names)
        }
        ResourceAddress::PreferenceList { namespace } => {
            let items = client
                .preferences(&namespace)
                .list(&ListParams::default())
                .await?;
            let names: Vec<String> =
                items.items.into_iter().filter_map(|it| it.metadata.name).collect();
            pretty(&names)
        }
        ResourceAddress::ClusterInstancetypeList => {
            let items = client
                .cluster_instancetypes()
                .list(&ListParams::default())
                .await?;
            let names: Vec<String> =
                items.items.into_iter().filter_map(|it| it.metadata.name).collect();
            pretty(&names)
        }
        ResourceAddress::ClusterPreferenceList => {
            let items = client
                .cluster_preferences()
                .list(&ListParams::default())
                .await?;
            let names: Vec<String> =
                items.items.into_iter().filter_map(|it| it.metadata.name).collect();
            pretty(&names)
        }
        ResourceAddress::ClusterInstancetype { name } => {
            let item = client
                .dynamic_cluster(&instancetype_gvk("VirtualMachineClusterInstancetype"))
                .get(&name)
                .await?;
            pretty(&item)
        }
        ResourceAddress::ClusterPreference { name } => {
            let item = client
                .dynamic_cluster(&instancetype_gvk("VirtualMachineClusterPreference"))
                .get(&name)
                .await?;
            pretty(&item)
        }
    }
}

fn pretty<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(KubeVirtError::from)
}

/// Compact list view of a VM.
pub fn vm_summary(vm: &VirtualMachine) -> Value {
    let status = vm.status.clone().unwrap_or_default();
    let mut info = Map::new();
    info.insert("name".to_string(), json!(vm.metadata.name));
    info.insert("namespace".to_string(), json!(vm.metadata.namespace));
    info.insert("status".to_string(), json!(status.printable_status));
    info.insert("created".to_string(), json!(vm.metadata.creation_timestamp));
    if let Some(strategy) = vm.spec.run_strategy {
        info.insert("runStrategy".to_string(), json!(strategy.to_string()));
    }
    if let Some(matcher) = &vm.spec.instancetype {
        info.insert("instanceType".to_string(), json!(matcher.name));
    }
    Value::Object(info)
}

/// Derived status view served at `vm/{name}/status`.
pub fn vm_status_detail(vm: &VirtualMachine) -> Value {
    let status = vm.status.clone().unwrap_or_default();
    let mut info = Map::new();
    info.insert("name".to_string(), json!(vm.metadata.name));
    info.insert("namespace".to_string(), json!(vm.metadata.namespace));
    info.insert("printableStatus".to_string(), json!(status.printable_status));
    info.insert("ready".to_string(), json!(status.ready));
    if let Some(strategy) = vm.spec.run_strategy {
        info.insert("runStrategy".to_string(), json!(strategy.to_string()));
    }
    info.insert(
        "observedGeneration".to_string(),
        json!(status.observed_generation),
    );
    info.insert(
        "desiredGeneration".to_string(),
        json!(status.desired_generation),
    );
    if !status.state_change_requests.is_empty() {
        info.insert(
            "stateChangeRequests".to_string(),
            json!(status.state_change_requests),
        );
    }
    if !status.conditions.is_empty() {
        info.insert("conditions".to_string(), json!(status.conditions));
    }
    Value::Object(info)
}

/// Compact list view of a VMI.
pub fn vmi_summary(vmi: &VirtualMachineInstance) -> Value {
    let status = vmi.status.clone().unwrap_or_default();
    let mut info = Map::new();
    info.insert("name".to_string(), json!(vmi.metadata.name));
    info.insert("namespace".to_string(), json!(vmi.metadata.namespace));
    info.insert("phase".to_string(), json!(status.phase));
    info.insert("created".to_string(), json!(vmi.metadata.creation_timestamp));
    info.insert("nodeName".to_string(), json!(status.node_name));
    if !status.interfaces.is_empty() {
        let interfaces: Vec<Value> = status
            .interfaces
            .iter()
            .map(|iface| {
                let mut entry = Map::new();
                entry.insert("name".to_string(), json!(iface.name));
                if let Some(ip) = &iface.ip_address {
                    entry.insert("ip".to_string(), json!(ip));
                }
                if let Some(mac) = &iface.mac {
                    entry.insert("mac".to_string(), json!(mac));
                }
                Value::Object(entry)
            })
            .collect();
        info.insert("interfaces".to_string(), json!(interfaces));
    }
    Value::Object(info)
}

/// Console availability served at `vm/{name}/console`. Consoles only exist
/// while the VMI is running; the payload then carries `virtctl` connection
/// hints and whether the guest agent is reachable.
pub fn console_info(namespace: &str, name: &str, vmi: Option<&VirtualMachineInstance>) -> Value {
    let status = vmi.and_then(|vmi| vmi.status.clone()).unwrap_or_default();
    let phase = status.phase.clone().unwrap_or_default();

    let mut info = Map::new();
    info.insert("name".to_string(), json!(name));
    info.insert("namespace".to_string(), json!(namespace));
    info.insert("phase".to_string(), json!(phase));

    if phase == "Running" {
        let consoles = json!([
            {
                "type": "vnc",
                "connectionInfo": format!("virtctl vnc {name} -n {namespace}"),
            },
            {
                "type": "serial",
                "connectionInfo": format!("virtctl console {name} -n {namespace}"),
            },
        ]);
        info.insert("availableConsoles".to_string(), consoles);

        let agent_connected = status
            .conditions
            .iter()
            .any(|cond| cond.type_ == "AgentConnected" && cond.status == "True");
        info.insert("guestAgentConnected".to_string(), json!(agent_connected));
    } else {
        info.insert("availableConsoles".to_string(), json!([]));
    }

    Value::Object(info)
}

/// Compact list view of a DataVolume: discriminated source, storage request,
/// and import progress when present.
pub fn datavolume_summary(dv: &DataVolume) -> Value {
    let status = dv.status.clone().unwrap_or_default();
    let mut info = Map::new();
    info.insert("name".to_string(), json!(dv.metadata.name));
    info.insert("namespace".to_string(), json!(dv.metadata.namespace));
    info.insert("phase".to_string(), json!(status.phase));
    info.insert("created".to_string(), json!(dv.metadata.creation_timestamp));

    if let Some(source) = &dv.spec.source {
        let mut entry = Map::new();
        if let Some(http) = &source.http {
            entry.insert("type".to_string(), json!("http"));
            entry.insert("url".to_string(), json!(http.url));
        } else if let Some(s3) = &source.s3 {
            entry.insert("type".to_string(), json!("s3"));
            entry.insert("url".to_string(), json!(s3.url));
        } else if let Some(registry) = &source.registry {
            entry.insert("type".to_string(), json!("registry"));
            entry.insert("url".to_string(), json!(registry.url));
        } else if let Some(pvc) = &source.pvc {
            entry.insert("type".to_string(), json!("pvc"));
            entry.insert("name".to_string(), json!(pvc.name));
            entry.insert("namespace".to_string(), json!(pvc.namespace));
        } else if source.upload.is_some() {
            entry.insert("type".to_string(), json!("upload"));
        } else if source.blank.is_some() {
            entry.insert("type".to_string(), json!("blank"));
        }
        if !entry.is_empty() {
            info.insert("source".to_string(), Value::Object(entry));
        }
    }

    if let Some(storage) = &dv.spec.storage {
        let mut entry = Map::new();
        if let Some(resources) = &storage.resources {
            if let Some(size) = resources.requests.get("storage") {
                entry.insert("size".to_string(), json!(size.0));
            }
        }
        if let Some(class) = &storage.storage_class_name {
            entry.insert("storageClass".to_string(), json!(class));
        }
        if !entry.is_empty() {
            info.insert("storage".to_string(), Value::Object(entry));
        }
    }

    if let Some(progress) = &status.progress {
        info.insert("progress".to_string(), json!(progress));
    }

    Value::Object(info)
}
