use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::filter::EnvFilter;

use kubevirt_mcp_core::VirtClient;
use kubevirt_mcp_server::KubeVirtMcpServer;

#[derive(Parser)]
#[command(
    name = "kubevirt-mcp-server",
    version,
    about = "Model Context Protocol server for KubeVirt virtual machine management",
    long_about = "Exposes KubeVirt virtual machine lifecycle operations, cluster resources, \
                  and analysis prompts to MCP clients over stdio. Cluster access uses the \
                  ambient kubeconfig or in-cluster service account."
)]
struct Cli {
    /// Log filter, e.g. "info" or "kubevirt_mcp_tools=debug" (RUST_LOG wins)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the MCP protocol, so all logging goes to stderr.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let virt = VirtClient::connect()
        .await
        .context("failed to build a Kubernetes client from the ambient configuration")?;
    info!("connected to cluster, starting MCP server on stdio");

    let server = KubeVirtMcpServer::new(virt);
    let service = rmcp::ServiceExt::serve(server, rmcp::transport::stdio())
        .await
        .context("MCP server startup failed")?;

    service.waiting().await.context("server error")?;
    Ok(())
}
