pub mod address;
pub mod apis;
pub mod client;
pub mod error;

pub use address::ResourceAddress;
pub use client::VirtClient;
pub use error::{KubeVirtError, Result};
