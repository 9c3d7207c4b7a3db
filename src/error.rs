use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DepsyncError {
    #[error("Workspace validation failed: {0}")]
    WorkspaceValidation(String),

    #[error("{command} failed ({status}): {stderr}")]
    Subprocess {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("No tag of {0} parses as a semantic version")]
    NoSemverTags(String),

    #[error("No remote tags and no local clone for {0}")]
    NotFound(String),

    #[error("Latest version of {library} is the pre-release {version}")]
    PreRelease { library: String, version: String },

    #[error("Invalid library coordinate '{0}': expected group/artifact")]
    Parse(String),

    #[error("{0} does not match the internal GitHub library convention")]
    NotGithubLib(String),

    #[error("Failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("User cancelled")]
    UserCancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DepsyncError>;
