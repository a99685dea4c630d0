//! Error types for the AirSync agent.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("netlink timeout: {0}")]
    Timeout(String),

    #[error("unsupported mode: {0}")]
    Unsupported(String),

    #[error("config store error: {0}")]
    Store(String),

    #[error("hardware error: {0}")]
    Hardware(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;
