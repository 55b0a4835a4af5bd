//! Virtual machine lifecycle tools.
//!
//! Start, stop, restart, pause, and unpause all work declaratively by
//! patching the VM's run strategy; the controller reconciles the VMI. Only
//! pause and unpause additionally touch the VMI subresource endpoints so the
//! guest is actually frozen and thawed.

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::api::{DeleteParams, ListParams, Patch, PatchParams, PostParams};
use serde_json::{json, Map, Value};
use tracing::debug;

use kubevirt_mcp_core::apis::{
    ContainerDiskSource, Devices, Disk, DiskTarget, DomainSpec, InstancetypeMatcher,
    PreferenceMatcher, ResourceRequirements, RunStrategy, VirtualMachine,
    VirtualMachineInstanceSpec, VirtualMachineInstanceTemplateSpec, VirtualMachineSpec, Volume,
};
use kubevirt_mcp_core::{KubeVirtError, Result, VirtClient};

use crate::containerdisk;
use crate::required;

/// List the names of all VMs in a namespace, one per line.
pub async fn list(client: &VirtClient, namespace: &str) -> Result<String> {
    let namespace = required(namespace, "namespace")?;
    let vms = client.vms(namespace).list(&ListParams::default()).await?;

    let mut names = String::new();
    for vm in vms.items {
        if let Some(name) = vm.metadata.name {
            names.push_str(&name);
            names.push('\n');
        }
    }
    Ok(names)
}

/// Start a VM by switching its run strategy to `Always`.
pub async fn start(client: &VirtClient, namespace: &str, name: &str) -> Result<String> {
    let namespace = required(namespace, "namespace")?;
    let name = required(name, "name")?;

    set_run_strategy(client, namespace, name, RunStrategy::Always).await?;
    Ok(format!("started {name}"))
}

/// Stop a VM by switching its run strategy to `Halted`.
pub async fn stop(client: &VirtClient, namespace: &str, name: &str) -> Result<String> {
    let namespace = required(namespace, "namespace")?;
    let name = required(name, "name")?;

    set_run_strategy(client, namespace, name, RunStrategy::Halted).await?;
    Ok(format!("stopped {name}"))
}

/// Restart a VM by deleting its VMI and letting the controller recreate it.
/// A VM with no running VMI is simply started.
pub async fn restart(client: &VirtClient, namespace: &str, name: &str) -> Result<String> {
    let namespace = required(namespace, "namespace")?;
    let name = required(name, "name")?;

    if client.vmis(namespace).get(name).await.is_err() {
        set_run_strategy(client, namespace, name, RunStrategy::Always).await?;
        return Ok(format!("started {name} (was not running)"));
    }

    client
        .vmis(namespace)
        .delete(name, &DeleteParams::default())
        .await?;
    set_run_strategy(client, namespace, name, RunStrategy::Always).await?;
    Ok(format!("restarted {name}"))
}

/// Pause a VM: take over lifecycle control with the `Manual` run strategy,
/// then freeze the guest through the pause subresource.
pub async fn pause(client: &VirtClient, namespace: &str, name: &str) -> Result<String> {
    let namespace = required(namespace, "namespace")?;
    let name = required(name, "name")?;

    // `running` and `runStrategy` are mutually exclusive; the null clears
    // any leftover `running` field so the merge patch cannot conflict.
    let patch = json!({"spec": {"runStrategy": "Manual", "running": null}});
    client
        .vms(namespace)
        .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;

    // Only running VMIs can be paused; a missing VMI is not an error.
    if client.vmis(namespace).get(name).await.is_ok() {
        client.pause_vmi(namespace, name).await?;
    }

    Ok(format!("paused VM {name} in namespace {namespace}"))
}

/// Unpause a VM: thaw the guest through the unpause subresource, then hand
/// lifecycle control back by restoring the `Always` run strategy.
pub async fn unpause(client: &VirtClient, namespace: &str, name: &str) -> Result<String> {
    let namespace = required(namespace, "namespace")?;
    let name = required(name, "name")?;

    if client.vmis(namespace).get(name).await.is_ok() {
        client.unpause_vmi(namespace, name).await?;
    }

    set_run_strategy(client, namespace, name, RunStrategy::Always).await?;
    Ok(format!("unpaused VM {name} in namespace {namespace}"))
}

/// Delete a VM along with its VMI.
pub async fn delete(client: &VirtClient, namespace: &str, name: &str) -> Result<String> {
    let namespace = required(namespace, "namespace")?;
    let name = required(name, "name")?;

    client
        .vms(namespace)
        .delete(name, &DeleteParams::default())
        .await?;
    Ok(format!("deleted VM {name} in namespace {namespace}"))
}

/// Create a halted VM backed by a containerdisk volume.
pub async fn create(
    client: &VirtClient,
    namespace: &str,
    name: &str,
    container_disk: &str,
    instancetype: Option<&str>,
    preference: Option<&str>,
) -> Result<String> {
    let namespace = required(namespace, "namespace")?;
    let name = required(name, "name")?;
    let container_disk = required(container_disk, "container_disk")?;

    let vm = build_vm(namespace, name, container_disk, instancetype, preference);
    debug!(namespace, name, "creating virtual machine");
    client.vms(namespace).create(&PostParams::default(), &vm).await?;
    Ok(format!("created VM {name} in namespace {namespace}"))
}

/// Build the VM object `create` submits. Halted by default, virtio disk bus,
/// and a 128Mi memory request unless an instancetype supplies the sizing.
pub fn build_vm(
    namespace: &str,
    name: &str,
    container_disk: &str,
    instancetype: Option<&str>,
    preference: Option<&str>,
) -> VirtualMachine {
    let image = containerdisk::resolve(container_disk);

    let resources = if instancetype.is_none() {
        let mut requests = std::collections::BTreeMap::new();
        requests.insert("memory".to_string(), Quantity("128Mi".to_string()));
        Some(ResourceRequirements {
            requests,
            limits: Default::default(),
        })
    } else {
        None
    };

    let spec = VirtualMachineSpec {
        run_strategy: Some(RunStrategy::Halted),
        running: None,
        instancetype: instancetype.map(|name| InstancetypeMatcher {
            name: name.to_string(),
            kind: Some("VirtualMachineClusterInstancetype".to_string()),
        }),
        preference: preference.map(|name| PreferenceMatcher {
            name: name.to_string(),
            kind: Some("VirtualMachineClusterPreference".to_string()),
        }),
        template: Some(VirtualMachineInstanceTemplateSpec {
            spec: VirtualMachineInstanceSpec {
                domain: DomainSpec {
                    devices: Devices {
                        disks: vec![Disk {
                            name: "containerdisk".to_string(),
                            disk: Some(DiskTarget {
                                bus: Some("virtio".to_string()),
                            }),
                        }],
                    },
                    resources,
                },
                volumes: vec![Volume {
                    name: "containerdisk".to_string(),
                    container_disk: Some(ContainerDiskSource { image }),
                }],
            },
        }),
    };

    let mut vm = VirtualMachine::new(name, spec);
    vm.metadata.namespace = Some(namespace.to_string());
    vm
}

/// Apply an arbitrary merge patch to a VM and report what changed.
pub async fn patch(
    client: &VirtClient,
    namespace: &str,
    name: &str,
    patch: &str,
) -> Result<String> {
    let namespace = required(namespace, "namespace")?;
    let name = required(name, "name")?;
    let patch = required(patch, "patch")?;

    let patch_value: Value =
        serde_json::from_str(patch).map_err(KubeVirtError::InvalidPatch)?;

    let current = client
        .vms(namespace)
        .get(name)
        .await
        .map_err(|source| KubeVirtError::GetVm {
            namespace: namespace.to_string(),
            name: name.to_string(),
            source,
        })?;

    let patched = client
        .vms(namespace)
        .patch(name, &PatchParams::default(), &Patch::Merge(&patch_value))
        .await
        .map_err(|source| KubeVirtError::PatchVm {
            namespace: namespace.to_string(),
            name: name.to_string(),
            source,
        })?;

    let result = json!({
        "name": patched.metadata.name,
        "namespace": patched.metadata.namespace,
        "message": "VM successfully patched",
        "generation": {
            "before": current.metadata.generation,
            "after": patched.metadata.generation,
        },
        "resourceVersion": {
            "before": current.metadata.resource_version,
            "after": patched.metadata.resource_version,
        },
    });
    Ok(serde_json::to_string_pretty(&result)?)
}

/// Report the instancetype a VM references, if any.
pub async fn get_instancetype(client: &VirtClient, namespace: &str, name: &str) -> Result<String> {
    let namespace = required(namespace, "namespace")?;
    let name = required(name, "name")?;

    let vm = client.vms(namespace).get(name).await?;
    Ok(match vm.spec.instancetype {
        Some(matcher) => matcher.name,
        None => "no instance type referenced by virtual machine".to_string(),
    })
}

/// Full status report: printable status, readiness, generations, run
/// strategy, and any pending state change requests.
pub async fn get_status(client: &VirtClient, namespace: &str, name: &str) -> Result<String> {
    let namespace = required(namespace, "namespace")?;
    let name = required(name, "name")?;

    let vm = client.vms(namespace).get(name).await?;
    let status = vm.status.clone().unwrap_or_default();

    let mut info = Map::new();
    info.insert("name".to_string(), json!(vm.metadata.name));
    info.insert("namespace".to_string(), json!(vm.metadata.namespace));
    info.insert("status".to_string(), json!(status.printable_status));
    info.insert("ready".to_string(), json!(status.ready));
    info.insert("created".to_string(), json!(vm.metadata.creation_timestamp));
    info.insert(
        "desiredGeneration".to_string(),
        json!(status.desired_generation),
    );
    info.insert(
        "observedGeneration".to_string(),
        json!(status.observed_generation),
    );
    if let Some(strategy) = vm.spec.run_strategy {
        info.insert("runStrategy".to_string(), json!(strategy.to_string()));
    }
    if !status.state_change_requests.is_empty() {
        let requests: Vec<Value> = status
            .state_change_requests
            .iter()
            .map(|req| {
                let mut entry = Map::new();
                entry.insert("action".to_string(), json!(req.action));
                if let Some(uid) = &req.uid {
                    entry.insert("uid".to_string(), json!(uid));
                }
                Value::Object(entry)
            })
            .collect();
        info.insert("stateChangeRequests".to_string(), json!(requests));
    }

    Ok(serde_json::to_string_pretty(&Value::Object(info))?)
}

/// Report the VM's status conditions.
pub async fn get_conditions(client: &VirtClient, namespace: &str, name: &str) -> Result<String> {
    let namespace = required(namespace, "namespace")?;
    let name = required(name, "name")?;

    let vm = client.vms(namespace).get(name).await?;
    let status = vm.status.clone().unwrap_or_default();

    let conditions: Vec<Value> = status
        .conditions
        .iter()
        .map(|cond| {
            let mut entry = Map::new();
            entry.insert("type".to_string(), json!(cond.type_));
            entry.insert("status".to_string(), json!(cond.status));
            entry.insert(
                "lastTransitionTime".to_string(),
                json!(cond.last_transition_time),
            );
            if let Some(reason) = &cond.reason {
                entry.insert("reason".to_string(), json!(reason));
            }
            if let Some(message) = &cond.message {
                entry.insert("message".to_string(), json!(message));
            }
            Value::Object(entry)
        })
        .collect();

    let result = json!({
        "name": vm.metadata.name,
        "namespace": vm.metadata.namespace,
        "conditions": conditions,
    });
    Ok(serde_json::to_string_pretty(&result)?)
}

/// Condensed lifecycle phase view of a VM.
pub async fn get_phase(client: &VirtClient, namespace: &str, name: &str) -> Result<String> {
    let namespace = required(namespace, "namespace")?;
    let name = required(name, "name")?;

    let vm = client.vms(namespace).get(name).await?;
    let status = vm.status.clone().unwrap_or_default();

    let mut info = Map::new();
    info.insert("name".to_string(), json!(vm.metadata.name));
    info.insert("namespace".to_string(), json!(vm.metadata.namespace));
    info.insert("status".to_string(), json!(status.printable_status));
    info.insert("ready".to_string(), json!(status.ready));
    if let Some(strategy) = vm.spec.run_strategy {
        info.insert("runStrategy".to_string(), json!(strategy.to_string()));
    }

    Ok(serde_json::to_string_pretty(&Value::Object(info))?)
}

/// List the disk names attached to a VM's template.
pub async fn disks(client: &VirtClient, namespace: &str, name: &str) -> Result<String> {
    let namespace = required(namespace, "namespace")?;
    let name = required(name, "name")?;

    let vm = client.vms(namespace).get(name).await?;
    let disk_names: Vec<String> = vm
        .spec
        .template
        .map(|template| {
            template
                .spec
                .domain
                .devices
                .disks
                .into_iter()
                .map(|disk| disk.name)
                .collect()
        })
        .unwrap_or_default();

    if disk_names.is_empty() {
        Ok("No disks found".to_string())
    } else {
        Ok(disk_names.join(", "))
    }
}

async fn set_run_strategy(
    client: &VirtClient,
    namespace: &str,
    name: &str,
    strategy: RunStrategy,
) -> Result<()> {
    let patch = json!({"spec": {"runStrategy": strategy}});
    client
        .vms(namespace)
        .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    Ok(())
}
