use std::process::ExitStatus;

pub type DeployResult<T> = Result<T, DeployError>;

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("command failed: {command}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("must be run as root (effective uid {0})")]
    NotRoot(String),

    #[error("prerequisite missing: {0}")]
    PrerequisiteMissing(String),

    #[error("container engine unreachable: {0}")]
    EngineUnreachable(String),

    #[error("not a valid IPv4 address: {0}")]
    InvalidIp(String),

    #[error("HTTP probe failed for {0}: {1}")]
    ProbeFailed(String, String),

    #[error("backup archive not found: {0}")]
    ArchiveNotFound(String),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
