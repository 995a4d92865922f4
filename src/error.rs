use thiserror::Error;

/// Unified error type for git-release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version file error: {0}")]
    VersionFile(String),

    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    #[error("Nothing to commit for '{0}': working tree matches HEAD")]
    NothingToCommit(String),

    #[error("Tag '{0}' already exists")]
    TagExists(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Branch error: {0}")]
    Branch(String),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Release step {step} failed")]
    StepFailed {
        /// Human readable description of the step that failed
        step: String,
        /// Descriptions of the steps that finished before the failure
        completed: Vec<String>,
        /// Whether any completed step already published to the remote
        published: bool,
        #[source]
        source: Box<ReleaseError>,
    },
}

/// Convenience type alias for Results in git-release
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a version file error with context
    pub fn version_file(msg: impl Into<String>) -> Self {
        ReleaseError::VersionFile(msg.into())
    }

    /// Create an invalid version error
    pub fn invalid_version(version: impl Into<String>, reason: impl Into<String>) -> Self {
        ReleaseError::InvalidVersion {
            version: version.into(),
            reason: reason.into(),
        }
    }

    /// Create a branch error with context
    pub fn branch(msg: impl Into<String>) -> Self {
        ReleaseError::Branch(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        ReleaseError::Remote(msg.into())
    }

    /// The innermost error, looking through `StepFailed` wrappers
    pub fn root_cause(&self) -> &ReleaseError {
        match self {
            ReleaseError::StepFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
