//! Prompt templates guiding an assistant through VM analysis workflows.
//!
//! Each builder returns `(description, prompt)`; the protocol layer wraps
//! the prompt into a single user-role message.

/// Comprehensive VM description walkthrough.
pub fn describe_vm(namespace: &str, name: &str) -> (String, String) {
    let description = format!(
        "Comprehensive description of virtual machine {name} in namespace {namespace}"
    );
    let prompt = format!(
        r#"Analyze the virtual machine {name} in namespace {namespace} and provide a comprehensive description including:

## VM Overview
- Current status and phase using get_vm_phase and get_vm_status tools
- Instance type details using get_vm_instancetype and get_instancetype tools
- Operating system preferences and configuration
- Creation time and generation information

## Configuration Details
- Network interfaces and connectivity type
- Resource allocation (CPU, memory) from instance type
- Live migration capabilities and requirements
- Security and access settings

## Operational Status
- Health conditions and readiness using get_vm_conditions
- Migration capabilities (LiveMigratable, StorageLiveMigratable)
- Recent state changes or pending operations
- Guest agent connectivity status

## Resource Analysis
- Instance type characteristics and use case suitability
- Network configuration impact on migration
- Storage configuration and accessibility
- Performance and scaling considerations

Please use the available MCP tools (get_vm_status, get_vm_conditions, get_vm_phase, get_vm_instancetype, get_instancetype) to gather comprehensive information and present it in a clear, organized format suitable for both technical review and operational planning.

Focus on providing actionable insights about the VM's current state, configuration optimizations, and operational readiness."#
    );
    (description, prompt)
}

/// Troubleshooting walkthrough, optionally seeded with a reported issue.
pub fn troubleshoot_vm(namespace: &str, name: &str, issue: Option<&str>) -> (String, String) {
    let description = format!(
        "Comprehensive troubleshooting analysis for virtual machine {name} in namespace {namespace}"
    );
    let issue_block = match issue {
        Some(issue) if !issue.is_empty() => format!("**Reported Issue:** {issue}\n\n"),
        _ => String::new(),
    };
    let prompt = format!(
        r#"Perform comprehensive troubleshooting analysis for virtual machine {name} in namespace {namespace}.

{issue_block}## Diagnostic Analysis

### 1. Current Status Assessment
- Check VM phase and ready state using get_vm_phase
- Analyze all condition statuses with get_vm_conditions
- Review detailed status information using get_vm_status
- Identify any failing conditions with reasons and messages

### 2. Configuration Validation
- Verify instance type compatibility using get_vm_instancetype and get_instancetype
- Check network interface configuration for migration support
- Validate resource allocation appropriateness
- Review security and access policies

### 3. Resource Analysis
- Assess CPU and memory allocation from instance type specifications
- Check for resource constraints or mismatches
- Analyze migration capabilities (LiveMigratable, StorageLiveMigratable)
- Evaluate instance type suitability for workload

### 4. Health Indicators
- Guest agent connectivity status
- Network connectivity validation
- Storage accessibility and configuration
- Operating system compatibility with preferences

## Issue Identification
Based on the comprehensive analysis, identify:
- Any failing conditions with detailed reasons and messages
- Configuration mismatches or conflicts
- Resource allocation problems or bottlenecks
- Network interface or storage access issues
- Instance type suitability concerns

## Root Cause Analysis
Correlate findings to determine the root cause:
- Configuration vs. operational issues
- Resource limitations vs. configuration problems
- Timing issues vs. persistent failures
- Infrastructure vs. application layer problems

## Actionable Recommendations
Provide specific, prioritized recommendations:
- **Immediate Actions**: Critical fixes needed now
- **Configuration Changes**: Patches or adjustments required
- **Resource Adjustments**: Scaling or reallocation needed
- **Preventive Measures**: Steps to avoid future issues

## Quick Resolution Steps
If appropriate, suggest immediate actions:
- VM restart requirements and procedures
- Configuration patches using patch_vm tool
- Resource scaling recommendations
- Network or storage troubleshooting steps

Use all available MCP tools systematically to gather comprehensive diagnostic information and provide expert-level troubleshooting guidance with specific, actionable solutions."#
    );
    (description, prompt)
}

/// Rapid pass/fail health checklist.
pub fn health_check_vm(namespace: &str, name: &str) -> (String, String) {
    let description = format!(
        "Quick health assessment of virtual machine {name} in namespace {namespace}"
    );
    let prompt = format!(
        r#"Perform a rapid health assessment of VM {name} in namespace {namespace} using available MCP tools.

## Quick Health Check Status Report

### 🔍 Status Indicators (use get_vm_status and get_vm_phase)
- [ ] VM Ready Status (check if ready: true)
- [ ] VM Running Status (check if status: "Running")
- [ ] Generation Sync (desiredGeneration == observedGeneration)
- [ ] No Pending State Changes (check stateChangeRequests)

### 🔍 Condition Health (use get_vm_conditions)
- [ ] Ready Condition (status: "True")
- [ ] Guest Agent Connected (status: "True")
- [ ] Live Migration Capable (status: "True" - indicates healthy networking)
- [ ] Storage Migration Ready (status: "True")
- [ ] No Failed Conditions (all conditions should be True or have acceptable reasons)

### 🔍 Configuration Health (use get_vm_instancetype and get_instancetype)
- [ ] Valid Instance Type Assignment
- [ ] Appropriate Resource Allocation
- [ ] Compatible Instance Type Configuration
- [ ] Proper CPU/Memory Balance

### 🔍 Operational Readiness
- [ ] Network Configuration Supports Migration
- [ ] No Recent Configuration Conflicts
- [ ] Stable Resource Allocation
- [ ] Guest OS Compatibility

## Health Summary Format
After checking all indicators, provide a clear status:

**Overall Health**: ✅ HEALTHY / ⚠️ WARNING / ❌ CRITICAL

**Key Findings**:
- List 2-3 most important status points
- Highlight any immediate concerns
- Note any configuration recommendations

**Immediate Actions** (if needed):
- Specific steps to resolve critical issues
- Configuration adjustments required
- Monitoring recommendations

**Migration Readiness**: ✅ READY / ⚠️ LIMITED / ❌ BLOCKED
- Brief explanation of migration capabilities

Focus on rapid assessment with clear pass/fail indicators and immediate actionable insights. Use the MCP tools efficiently to gather essential health information without extensive analysis."#
    );
    (description, prompt)
}
