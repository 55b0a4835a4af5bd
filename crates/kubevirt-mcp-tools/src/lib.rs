//! Tool and resource handlers backing the KubeVirt MCP server.
//!
//! Each handler takes a [`VirtClient`](kubevirt_mcp_core::VirtClient) and
//! validated string parameters and returns the text payload the protocol
//! layer wraps into a tool or resource result.

pub mod containerdisk;
pub mod instancetype;
pub mod preference;
pub mod resources;
pub mod vm;

use kubevirt_mcp_core::{KubeVirtError, Result};

/// Reject empty string parameters before touching the cluster.
pub(crate) fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str> {
    if value.is_empty() {
        return Err(KubeVirtError::MissingArgument(field));
    }
    Ok(value)
}
