use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TagscopeError {
    #[error("project root must be an absolute path: {0}")]
    InvalidPath(PathBuf),
    #[error("external tool failed: `{command}`: {stderr}")]
    ExternalTool { command: String, stderr: String },
    #[error("malformed tool output line: {0:?}")]
    MalformedOutput(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TagscopeError>;
