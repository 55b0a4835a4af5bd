use thiserror::Error;

/// Errors shared across the KubeVirt MCP crates.
///
/// Validation variants are always produced before any remote call is made;
/// remote failures propagate the underlying `kube::Error` unchanged apart
/// from the contextual prefixes carried by the dedicated variants.
#[derive(Error, Debug)]
pub enum KubeVirtError {
    #[error("invalid URI format, expected {0}")]
    InvalidUri(String),

    #[error("resource {0} may not be empty")]
    EmptySegment(&'static str),

    #[error("{0} parameter is required")]
    MissingArgument(&'static str),

    #[error("invalid JSON in patch parameter: {0}")]
    InvalidPatch(#[source] serde_json::Error),

    #[error("failed to get VM {namespace}/{name}: {source}")]
    GetVm {
        namespace: String,
        name: String,
        #[source]
        source: kube::Error,
    },

    #[error("failed to patch VM {namespace}/{name}: {source}")]
    PatchVm {
        namespace: String,
        name: String,
        #[source]
        source: kube::Error,
    },

    #[error("failed to pause VMI: {0}")]
    Pause(#[source] kube::Error),

    #[error("failed to unpause VMI: {0}")]
    Unpause(#[source] kube::Error),

    #[error("kubernetes configuration error: {0}")]
    Config(#[from] kube::config::InferConfigError),

    #[error(transparent)]
    Kube(#[from] kube::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] http::Error),
}

impl KubeVirtError {
    /// True for errors detected locally, before any request left the process.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            KubeVirtError::InvalidUri(_)
                | KubeVirtError::EmptySegment(_)
                | KubeVirtError::MissingArgument(_)
                | KubeVirtError::InvalidPatch(_)
        )
    }

    /// True when the underlying API response was a 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, KubeVirtError::Kube(kube::Error::Api(response)) if response.code == 404)
    }
}

pub type Result<T> = std::result::Result<T, KubeVirtError>;
