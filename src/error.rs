use std::fmt;

/// Result type for pong-rl operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Main error type for the learning core
#[derive(Debug, Clone)]
pub enum AgentError {
    /// Sampling was attempted on a replay buffer holding zero transitions
    EmptyBuffer(String),

    /// Checkpoint save/load failure, carrying the underlying cause
    Checkpoint(String),

    /// Invalid hyperparameter value at construction
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// IO errors (file operations)
    Io(String),

    /// Serialization/deserialization errors
    Serialization(String),

    /// Numerical computation errors (degenerate sampling distribution etc.)
    Numerical(String),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::EmptyBuffer(msg) => write!(f, "Empty buffer: {}", msg),
            AgentError::Checkpoint(msg) => write!(f, "Checkpoint error: {}", msg),
            AgentError::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{}': {}", name, reason)
            }
            AgentError::Io(msg) => write!(f, "IO error: {}", msg),
            AgentError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            AgentError::Numerical(msg) => write!(f, "Numerical error: {}", msg),
        }
    }
}

impl std::error::Error for AgentError {}

impl From<std::io::Error> for AgentError {
    fn from(err: std::io::Error) -> Self {
        AgentError::Io(err.to_string())
    }
}

impl From<bincode::Error> for AgentError {
    fn from(err: bincode::Error) -> Self {
        AgentError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::Serialization(err.to_string())
    }
}

impl AgentError {
    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        AgentError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
