use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdlcaiError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{endpoint} returned {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("home directory not found: set HOME or SDLCAI_HOME")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SdlcaiError {
    /// True for failures of a request that reached (or tried to reach) the API.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            SdlcaiError::Status { .. } | SdlcaiError::Transport { .. } | SdlcaiError::Decode { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SdlcaiError>;
