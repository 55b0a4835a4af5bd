//! rmcp protocol front-end: tool router, prompt router, and resource
//! dispatch over a shared [`VirtClient`].

use rmcp::{
    handler::server::{
        router::{prompt::PromptRouter, tool::ToolRouter},
        wrapper::Parameters,
    },
    model::*,
    prompt, prompt_handler, prompt_router,
    service::RequestContext,
    tool, tool_handler, tool_router, ErrorData as McpError, RoleServer, ServerHandler,
};
use serde::Deserialize;
use serde_json::json;

use kubevirt_mcp_core::VirtClient;
use kubevirt_mcp_tools::{instancetype, preference, resources, vm};

use crate::prompts;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct NamespaceArgs {
    /// The namespace of the virtual machines
    pub namespace: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct VmArgs {
    /// The namespace of the virtual machine
    pub namespace: String,
    /// The name of the virtual machine
    pub name: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateVmArgs {
    /// The namespace of the virtual machine
    pub namespace: String,
    /// The name of the virtual machine
    pub name: String,
    /// Container disk image or OS name (fedora, ubuntu, cirros, ...)
    pub container_disk: String,
    /// Optional cluster instancetype to reference
    #[serde(default)]
    pub instancetype: Option<String>,
    /// Optional cluster preference to reference
    #[serde(default)]
    pub preference: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PatchVmArgs {
    /// The namespace of the virtual machine
    pub namespace: String,
    /// The name of the virtual machine
    pub name: String,
    /// JSON merge patch to apply to the virtual machine
    pub patch: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct NameArgs {
    /// The name of the cluster-scoped object
    pub name: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TroubleshootVmArgs {
    /// The namespace of the virtual machine
    pub namespace: String,
    /// The name of the virtual machine
    pub name: String,
    /// Optional description of the observed problem
    #[serde(default)]
    pub issue_description: Option<String>,
}

/// The MCP server: one cluster client shared by every handler.
#[derive(Clone)]
pub struct KubeVirtMcpServer {
    virt: VirtClient,
    tool_router: ToolRouter<KubeVirtMcpServer>,
    prompt_router: PromptRouter<KubeVirtMcpServer>,
}

fn render(result: kubevirt_mcp_core::Result<String>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
        Err(err) => {
            tracing::warn!(error = %err, "tool call failed");
            Ok(CallToolResult::error(vec![Content::text(err.to_string())]))
        }
    }
}

fn prompt_result(description: String, prompt: String) -> GetPromptResult {
    GetPromptResult {
        description: Some(description),
        messages: vec![PromptMessage {
            role: PromptMessageRole::User,
            content: PromptMessageContent::text(prompt),
        }],
    }
}

fn require_prompt_arg(value: &str, field: &'static str) -> Result<(), McpError> {
    if value.is_empty() {
        return Err(McpError::invalid_params(
            format!("{field} parameter is required"),
            None,
        ));
    }
    Ok(())
}

#[tool_router]
impl KubeVirtMcpServer {
    pub fn new(virt: VirtClient) -> Self {
        Self {
            virt,
            tool_router: Self::tool_router(),
            prompt_router: Self::prompt_router(),
        }
    }

    #[tool(description = "List the names of virtual machines within a given namespace")]
    async fn list_vms(
        &self,
        args: Parameters<NamespaceArgs>,
    ) -> Result<CallToolResult, McpError> {
        render(vm::list(&self.virt, &args.0.namespace).await)
    }

    #[tool(description = "Start the virtual machine with a given name in the provided namespace")]
    async fn start_vm(&self, args: Parameters<VmArgs>) -> Result<CallToolResult, McpError> {
        render(vm::start(&self.virt, &args.0.namespace, &args.0.name).await)
    }

    #[tool(description = "Stop the virtual machine with a given name in the provided namespace")]
    async fn stop_vm(&self, args: Parameters<VmArgs>) -> Result<CallToolResult, McpError> {
        render(vm::stop(&self.virt, &args.0.namespace, &args.0.name).await)
    }

    #[tool(
        description = "Restart the virtual machine by recreating its running instance; a stopped machine is started"
    )]
    async fn restart_vm(&self, args: Parameters<VmArgs>) -> Result<CallToolResult, McpError> {
        render(vm::restart(&self.virt, &args.0.namespace, &args.0.name).await)
    }

    #[tool(description = "Pause the running virtual machine, freezing the guest")]
    async fn pause_vm(&self, args: Parameters<VmArgs>) -> Result<CallToolResult, McpError> {
        render(vm::pause(&self.virt, &args.0.namespace, &args.0.name).await)
    }

    #[tool(description = "Unpause the virtual machine and resume the guest")]
    async fn unpause_vm(&self, args: Parameters<VmArgs>) -> Result<CallToolResult, McpError> {
        render(vm::unpause(&self.virt, &args.0.namespace, &args.0.name).await)
    }

    #[tool(description = "Delete the virtual machine and its running instance")]
    async fn delete_vm(&self, args: Parameters<VmArgs>) -> Result<CallToolResult, McpError> {
        render(vm::delete(&self.virt, &args.0.namespace, &args.0.name).await)
    }

    #[tool(
        description = "Create a halted virtual machine from a container disk image, optionally referencing a cluster instancetype and preference"
    )]
    async fn create_vm(&self, args: Parameters<CreateVmArgs>) -> Result<CallToolResult, McpError> {
        render(
            vm::create(
                &self.virt,
                &args.0.namespace,
                &args.0.name,
                &args.0.container_disk,
                args.0.instancetype.as_deref(),
                args.0.preference.as_deref(),
            )
            .await,
        )
    }

    #[tool(
        description = "Apply a JSON merge patch to the virtual machine and report the resulting generation and resourceVersion changes"
    )]
    async fn patch_vm(&self, args: Parameters<PatchVmArgs>) -> Result<CallToolResult, McpError> {
        render(vm::patch(&self.virt, &args.0.namespace, &args.0.name, &args.0.patch).await)
    }

    #[tool(
        description = "Show the name of the instance type referenced by a virtual machine"
    )]
    async fn get_vm_instancetype(
        &self,
        args: Parameters<VmArgs>,
    ) -> Result<CallToolResult, McpError> {
        render(vm::get_instancetype(&self.virt, &args.0.namespace, &args.0.name).await)
    }

    #[tool(
        description = "Show the detailed status of a virtual machine including readiness, generations, and pending state changes"
    )]
    async fn get_vm_status(&self, args: Parameters<VmArgs>) -> Result<CallToolResult, McpError> {
        render(vm::get_status(&self.virt, &args.0.namespace, &args.0.name).await)
    }

    #[tool(description = "Show the status conditions of a virtual machine")]
    async fn get_vm_conditions(
        &self,
        args: Parameters<VmArgs>,
    ) -> Result<CallToolResult, McpError> {
        render(vm::get_conditions(&self.virt, &args.0.namespace, &args.0.name).await)
    }

    #[tool(description = "Show the current lifecycle phase of a virtual machine")]
    async fn get_vm_phase(&self, args: Parameters<VmArgs>) -> Result<CallToolResult, McpError> {
        render(vm::get_phase(&self.virt, &args.0.namespace, &args.0.name).await)
    }

    #[tool(description = "List the disks attached to a virtual machine")]
    async fn get_vm_disks(&self, args: Parameters<VmArgs>) -> Result<CallToolResult, McpError> {
        render(vm::disks(&self.virt, &args.0.namespace, &args.0.name).await)
    }

    #[tool(description = "List the names of all cluster instance types")]
    async fn list_instancetypes(&self) -> Result<CallToolResult, McpError> {
        render(instancetype::list(&self.virt).await)
    }

    #[tool(description = "Show a cluster instance type including its resource specification")]
    async fn get_instancetype(
        &self,
        args: Parameters<NameArgs>,
    ) -> Result<CallToolResult, McpError> {
        render(instancetype::get(&self.virt, &args.0.name).await)
    }

    #[tool(description = "Show a cluster preference including its specification")]
    async fn get_preference(
        &self,
        args: Parameters<NameArgs>,
    ) -> Result<CallToolResult, McpError> {
        render(preference::get(&self.virt, &args.0.name).await)
    }
}

#[prompt_router]
impl KubeVirtMcpServer {
    /// Comprehensive description of a virtual machine's configuration and state
    #[prompt(name = "describe_vm")]
    async fn describe_vm(
        &self,
        args: Parameters<VmArgs>,
        _ctx: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        require_prompt_arg(&args.0.namespace, "namespace")?;
        require_prompt_arg(&args.0.name, "name")?;
        let (description, prompt) = prompts::describe_vm(&args.0.namespace, &args.0.name);
        Ok(prompt_result(description, prompt))
    }

    /// Structured troubleshooting analysis of a virtual machine
    #[prompt(name = "troubleshoot_vm")]
    async fn troubleshoot_vm(
        &self,
        args: Parameters<TroubleshootVmArgs>,
        _ctx: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        require_prompt_arg(&args.0.namespace, "namespace")?;
        require_prompt_arg(&args.0.name, "name")?;
        let (description, prompt) = prompts::troubleshoot_vm(
            &args.0.namespace,
            &args.0.name,
            args.0.issue_description.as_deref(),
        );
        Ok(prompt_result(description, prompt))
    }

    /// Rapid pass/fail health checklist for a virtual machine
    #[prompt(name = "health_check_vm")]
    async fn health_check_vm(
        &self,
        args: Parameters<VmArgs>,
        _ctx: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        require_prompt_arg(&args.0.namespace, "namespace")?;
        require_prompt_arg(&args.0.name, "name")?;
        let (description, prompt) = prompts::health_check_vm(&args.0.namespace, &args.0.name);
        Ok(prompt_result(description, prompt))
    }
}

fn template(
    uri_template: &str,
    name: &str,
    title: &str,
    description: &str,
) -> ResourceTemplate {
    RawResourceTemplate {
        uri_template: uri_template.to_string(),
        name: name.to_string(),
        title: Some(title.to_string()),
        description: Some(description.to_string()),
        mime_type: Some("application/json".to_string()),
    }
    .no_annotation()
}

#[tool_handler]
#[prompt_handler]
impl ServerHandler for KubeVirtMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_prompts()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "This server manages KubeVirt virtual machines in a Kubernetes cluster. \
                 \n\nLifecycle: list_vms, start_vm, stop_vm, restart_vm, pause_vm, unpause_vm, \
                 create_vm, delete_vm, patch_vm \
                 \n\nInspection: get_vm_status, get_vm_conditions, get_vm_phase, get_vm_disks, \
                 get_vm_instancetype, list_instancetypes, get_instancetype, get_preference \
                 \n\nResources use kubevirt:// URIs, for example kubevirt://{namespace}/vms or \
                 kubevirt://{namespace}/vm/{name}/status; cluster-scoped objects live under \
                 kubevirt://cluster/. Prompts describe_vm, troubleshoot_vm, and health_check_vm \
                 guide deeper analysis."
                    .to_string(),
            ),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        // Everything is namespace- or name-parameterised; only templates are
        // advertised.
        Ok(ListResourcesResult {
            resources: vec![],
            next_cursor: None,
        })
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        let templates = vec![
            template(
                "kubevirt://{namespace}/vms",
                "virtual-machines",
                "Virtual Machines",
                "Summaries of the virtual machines in a namespace",
            ),
            template(
                "kubevirt://{namespace}/vm/{name}",
                "virtual-machine",
                "Virtual Machine",
                "Full virtual machine object",
            ),
            template(
                "kubevirt://{namespace}/vm/{name}/status",
                "virtual-machine-status",
                "Virtual Machine Status",
                "Derived status of a virtual machine",
            ),
            template(
                "kubevirt://{namespace}/vm/{name}/console",
                "virtual-machine-console",
                "Virtual Machine Console",
                "Console availability and virtctl connection hints",
            ),
            template(
                "kubevirt://{namespace}/vmis",
                "virtual-machine-instances",
                "Virtual Machine Instances",
                "Summaries of the running virtual machine instances in a namespace",
            ),
            template(
                "kubevirt://{namespace}/vmi/{name}",
                "virtual-machine-instance",
                "Virtual Machine Instance",
                "Full virtual machine instance object",
            ),
            template(
                "kubevirt://{namespace}/vmi/{name}/guestosinfo",
                "guest-os-info",
                "Guest OS Information",
                "Guest operating system details reported by the guest agent",
            ),
            template(
                "kubevirt://{namespace}/vmi/{name}/filesystems",
                "guest-filesystems",
                "Guest Filesystems",
                "Filesystem list reported by the guest agent",
            ),
            template(
                "kubevirt://{namespace}/vmi/{name}/userlist",
                "guest-users",
                "Guest Users",
                "Logged-in users reported by the guest agent",
            ),
            template(
                "kubevirt://{namespace}/datavolumes",
                "data-volumes",
                "Data Volumes",
                "Summaries of the data volumes in a namespace",
            ),
            template(
                "kubevirt://{namespace}/datavolume/{name}",
                "data-volume",
                "Data Volume",
                "Full data volume object",
            ),
            template(
                "kubevirt://{namespace}/instancetypes",
                "instancetypes",
                "Instance Types",
                "Names of the namespaced instance types; use kubevirt://cluster/instancetypes for cluster scope",
            ),
            template(
                "kubevirt://{namespace}/preferences",
                "preferences",
                "Preferences",
                "Names of the namespaced preferences; use kubevirt://cluster/preferences for cluster scope",
            ),
            template(
                "kubevirt://cluster/cluster-instancetype/{name}",
                "cluster-instancetype",
                "Cluster Instance Type",
                "Full cluster instance type object",
            ),
            template(
                "kubevirt://cluster/cluster-preference/{name}",
                "cluster-preference",
                "Cluster Preference",
                "Full cluster preference object",
            ),
        ];

        Ok(ListResourceTemplatesResult {
            next_cursor: None,
            resource_templates: templates,
        })
    }

    async fn read_resource(
        &self,
        ReadResourceRequestParam { uri }: ReadResourceRequestParam,
        _: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        match resources::read(&self.virt, &uri).await {
            Ok(text) => Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(text, uri)],
            }),
            Err(err) if err.is_validation() => Err(McpError::invalid_params(
                err.to_string(),
                Some(json!({"uri": uri})),
            )),
            Err(err) if err.is_not_found() => Err(McpError::resource_not_found(
                err.to_string(),
                Some(json!({"uri": uri})),
            )),
            Err(err) => {
                tracing::warn!(error = %err, uri = %uri, "resource read failed");
                Err(McpError::internal_error(
                    err.to_string(),
                    Some(json!({"uri": uri})),
                ))
            }
        }
    }
}
