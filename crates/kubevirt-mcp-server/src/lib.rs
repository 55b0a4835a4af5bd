pub mod prompts;
pub mod server;

pub use server::KubeVirtMcpServer;
