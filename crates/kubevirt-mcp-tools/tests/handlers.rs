//! Handler tests against a mocked Kubernetes API server.

use http::Uri;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kubevirt_mcp_core::VirtClient;
use kubevirt_mcp_tools::{resources, vm};

async fn mock_client(server: &MockServer) -> VirtClient {
    let uri: Uri = server.uri().parse().expect("mock server uri");
    let config = kube::Config::new(uri);
    let client = kube::Client::try_from(config).expect("client from mock config");
    VirtClient::from_client(client)
}

fn vm_object(name: &str, namespace: &str) -> serde_json::Value {
    json!({
        "apiVersion": "kubevirt.io/v1",
        "kind": "VirtualMachine",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "generation": 1,
            "resourceVersion": "100",
            "creationTimestamp": "2024-01-01T00:00:00Z"
        },
        "spec": {
            "runStrategy": "Always"
        },
        "status": {
            "ready": true,
            "printableStatus": "Running"
        }
    })
}

#[tokio::test]
async fn list_vms_returns_names_per_line() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/apis/kubevirt.io/v1/namespaces/ns1/virtualmachines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "apiVersion": "kubevirt.io/v1",
            "kind": "VirtualMachineList",
            "metadata": {"resourceVersion": "1"},
            "items": [vm_object("vm1", "ns1"), vm_object("vm2", "ns1")]
        })))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let names = vm::list(&client, "ns1").await.expect("list");
    assert_eq!(names, "vm1\nvm2\n");
}

#[tokio::test]
async fn list_vms_rejects_empty_namespace_before_any_request() {
    let server = MockServer::start().await;
    let client = mock_client(&server).await;

    let err = vm::list(&client, "").await.expect_err("validation");
    assert_eq!(err.to_string(), "namespace parameter is required");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn start_vm_patches_run_strategy() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/apis/kubevirt.io/v1/namespaces/ns1/virtualmachines/vm1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vm_object("vm1", "ns1")))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let message = vm::start(&client, "ns1", "vm1").await.expect("start");
    assert_eq!(message, "started vm1");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["spec"]["runStrategy"], "Always");
}

#[tokio::test]
async fn stop_vm_patches_run_strategy_to_halted() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/apis/kubevirt.io/v1/namespaces/ns1/virtualmachines/vm1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vm_object("vm1", "ns1")))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let message = vm::stop(&client, "ns1", "vm1").await.expect("stop");
    assert_eq!(message, "stopped vm1");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["spec"]["runStrategy"], "Halted");
}

#[tokio::test]
async fn restart_vm_without_vmi_just_starts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(
            "/apis/kubevirt.io/v1/namespaces/ns1/virtualmachineinstances/vm1",
        ))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "kind": "Status",
            "apiVersion": "v1",
            "status": "Failure",
            "reason": "NotFound",
            "code": 404
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/apis/kubevirt.io/v1/namespaces/ns1/virtualmachines/vm1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vm_object("vm1", "ns1")))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let message = vm::restart(&client, "ns1", "vm1").await.expect("restart");
    assert_eq!(message, "started vm1 (was not running)");
}

#[tokio::test]
async fn restart_vm_with_a_running_vmi_deletes_it_before_patching() {
    let server = MockServer::start().await;
    let vmi = json!({
        "apiVersion": "kubevirt.io/v1",
        "kind": "VirtualMachineInstance",
        "metadata": {"name": "vm1", "namespace": "ns1"},
        "spec": {},
        "status": {"phase": "Running"}
    });
    Mock::given(method("GET"))
        .and(path(
            "/apis/kubevirt.io/v1/namespaces/ns1/virtualmachineinstances/vm1",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(vmi.clone()))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(
            "/apis/kubevirt.io/v1/namespaces/ns1/virtualmachineinstances/vm1",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(vmi))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/apis/kubevirt.io/v1/namespaces/ns1/virtualmachines/vm1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vm_object("vm1", "ns1")))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let message = vm::restart(&client, "ns1", "vm1").await.expect("restart");
    assert_eq!(message, "restarted vm1");

    let requests = server.received_requests().await.unwrap();
    let patch = requests
        .iter()
        .find(|req| req.method.as_str() == "PATCH")
        .expect("patch request");
    let body: serde_json::Value = serde_json::from_slice(&patch.body).unwrap();
    assert_eq!(body["spec"]["runStrategy"], "Always");
}

#[tokio::test]
async fn pause_vm_hits_the_pause_subresource() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/apis/kubevirt.io/v1/namespaces/ns1/virtualmachines/vm1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vm_object("vm1", "ns1")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(
            "/apis/kubevirt.io/v1/namespaces/ns1/virtualmachineinstances/vm1",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "apiVersion": "kubevirt.io/v1",
            "kind": "VirtualMachineInstance",
            "metadata": {"name": "vm1", "namespace": "ns1"},
            "spec": {},
            "status": {"phase": "Running"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(
            "/apis/subresources.kubevirt.io/v1/namespaces/ns1/virtualmachineinstances/vm1/pause",
        ))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let message = vm::pause(&client, "ns1", "vm1").await.expect("pause");
    assert_eq!(message, "paused VM vm1 in namespace ns1");
}

#[tokio::test]
async fn pause_vm_wraps_subresource_failures() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/apis/kubevirt.io/v1/namespaces/ns1/virtualmachines/vm1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vm_object("vm1", "ns1")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(
            "/apis/kubevirt.io/v1/namespaces/ns1/virtualmachineinstances/vm1",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "apiVersion": "kubevirt.io/v1",
            "kind": "VirtualMachineInstance",
            "metadata": {"name": "vm1", "namespace": "ns1"},
            "spec": {},
            "status": {"phase": "Running"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(
            "/apis/subresources.kubevirt.io/v1/namespaces/ns1/virtualmachineinstances/vm1/pause",
        ))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "kind": "Status",
            "apiVersion": "v1",
            "status": "Failure",
            "message": "VMI is not running",
            "reason": "InternalError",
            "code": 500
        })))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let err = vm::pause(&client, "ns1", "vm1").await.expect_err("pause");
    assert!(
        err.to_string().starts_with("failed to pause VMI:"),
        "{err}"
    );
}

#[tokio::test]
async fn unpause_vm_wraps_subresource_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(
            "/apis/kubevirt.io/v1/namespaces/ns1/virtualmachineinstances/vm1",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "apiVersion": "kubevirt.io/v1",
            "kind": "VirtualMachineInstance",
            "metadata": {"name": "vm1", "namespace": "ns1"},
            "spec": {},
            "status": {"phase": "Running"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(
            "/apis/subresources.kubevirt.io/v1/namespaces/ns1/virtualmachineinstances/vm1/unpause",
        ))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "kind": "Status",
            "apiVersion": "v1",
            "status": "Failure",
            "message": "VMI is not paused",
            "reason": "InternalError",
            "code": 500
        })))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let err = vm::unpause(&client, "ns1", "vm1")
        .await
        .expect_err("unpause");
    assert!(
        err.to_string().starts_with("failed to unpause VMI:"),
        "{err}"
    );
}

#[tokio::test]
async fn get_vm_disks_reports_the_sentinel_without_disks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/apis/kubevirt.io/v1/namespaces/ns1/virtualmachines/vm1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vm_object("vm1", "ns1")))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let message = vm::disks(&client, "ns1", "vm1").await.expect("disks");
    assert_eq!(message, "No disks found");
}

#[tokio::test]
async fn get_vm_disks_joins_disk_names() {
    let server = MockServer::start().await;
    let mut object = vm_object("vm1", "ns1");
    object["spec"]["template"] = json!({
        "spec": {
            "domain": {
                "devices": {
                    "disks": [
                        {"name": "containerdisk", "disk": {"bus": "virtio"}},
                        {"name": "cloudinitdisk", "disk": {"bus": "virtio"}}
                    ]
                }
            }
        }
    });
    Mock::given(method("GET"))
        .and(path("/apis/kubevirt.io/v1/namespaces/ns1/virtualmachines/vm1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(object))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let message = vm::disks(&client, "ns1", "vm1").await.expect("disks");
    assert_eq!(message, "containerdisk, cloudinitdisk");
}

#[tokio::test]
async fn get_vm_instancetype_reports_the_sentinel_when_unset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/apis/kubevirt.io/v1/namespaces/ns1/virtualmachines/vm1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vm_object("vm1", "ns1")))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let message = vm::get_instancetype(&client, "ns1", "vm1")
        .await
        .expect("get instancetype");
    assert_eq!(message, "no instance type referenced by virtual machine");
}

#[tokio::test]
async fn get_vm_instancetype_reports_the_matcher_name() {
    let server = MockServer::start().await;
    let mut object = vm_object("vm1", "ns1");
    object["spec"]["instancetype"] = json!({"name": "u1.medium"});
    Mock::given(method("GET"))
        .and(path("/apis/kubevirt.io/v1/namespaces/ns1/virtualmachines/vm1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(object))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let message = vm::get_instancetype(&client, "ns1", "vm1")
        .await
        .expect("get instancetype");
    assert_eq!(message, "u1.medium");
}

#[tokio::test]
async fn patch_vm_rejects_invalid_json_locally() {
    let server = MockServer::start().await;
    let client = mock_client(&server).await;

    let err = vm::patch(&client, "ns1", "vm1", "{not json")
        .await
        .expect_err("invalid patch");
    assert!(err
        .to_string()
        .starts_with("invalid JSON in patch parameter"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn patch_vm_reports_generation_change() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/apis/kubevirt.io/v1/namespaces/ns1/virtualmachines/vm1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vm_object("vm1", "ns1")))
        .mount(&server)
        .await;
    let mut patched = vm_object("vm1", "ns1");
    patched["metadata"]["generation"] = json!(2);
    patched["metadata"]["resourceVersion"] = json!("101");
    Mock::given(method("PATCH"))
        .and(path("/apis/kubevirt.io/v1/namespaces/ns1/virtualmachines/vm1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(patched))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let report = vm::patch(&client, "ns1", "vm1", r#"{"spec":{"runStrategy":"Halted"}}"#)
        .await
        .expect("patch");
    let report: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(report["message"], "VM successfully patched");
    assert_eq!(report["generation"]["before"], 1);
    assert_eq!(report["generation"]["after"], 2);
    assert_eq!(report["resourceVersion"]["before"], "100");
    assert_eq!(report["resourceVersion"]["after"], "101");
}

#[tokio::test]
async fn create_vm_posts_the_built_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/apis/kubevirt.io/v1/namespaces/ns1/virtualmachines"))
        .respond_with(ResponseTemplate::new(201).set_body_json(vm_object("vm1", "ns1")))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let message = vm::create(&client, "ns1", "vm1", "fedora", None, None)
        .await
        .expect("create");
    assert_eq!(message, "created VM vm1 in namespace ns1");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["spec"]["runStrategy"], "Halted");
    assert_eq!(
        body["spec"]["template"]["spec"]["volumes"][0]["containerDisk"]["image"],
        "quay.io/containerdisks/fedora:latest"
    );
}

#[tokio::test]
async fn vms_resource_projects_summaries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/apis/kubevirt.io/v1/namespaces/ns1/virtualmachines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "apiVersion": "kubevirt.io/v1",
            "kind": "VirtualMachineList",
            "metadata": {"resourceVersion": "1"},
            "items": [vm_object("vm1", "ns1")]
        })))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let text = resources::read(&client, "kubevirt://ns1/vms")
        .await
        .expect("read");
    let payload: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(payload[0]["name"], "vm1");
    assert_eq!(payload[0]["status"], "Running");
    assert_eq!(payload[0]["runStrategy"], "Always");
}

#[tokio::test]
async fn console_resource_is_empty_for_a_missing_vmi() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(
            "/apis/kubevirt.io/v1/namespaces/ns1/virtualmachineinstances/vm1",
        ))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "kind": "Status",
            "apiVersion": "v1",
            "status": "Failure",
            "reason": "NotFound",
            "code": 404
        })))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let text = resources::read(&client, "kubevirt://ns1/vm/vm1/console")
        .await
        .expect("read");
    let payload: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(payload["availableConsoles"], json!([]));
    assert!(payload.get("guestAgentConnected").is_none());
}

#[tokio::test]
async fn invalid_resource_uri_fails_without_any_request() {
    let server = MockServer::start().await;
    let client = mock_client(&server).await;

    let err = resources::read(&client, "kubevirt://ns1/unknown")
        .await
        .expect_err("invalid uri");
    assert!(err.to_string().starts_with("invalid URI format"));
    assert!(server.received_requests().await.unwrap().is_empty());
}
