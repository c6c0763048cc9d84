use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PackageManagerError {
    #[error("package manager configuration error: {0}")]
    Configuration(String),
    #[error("package manager process error: {0}")]
    Process(String),
    #[error("package manager protocol error: {0}")]
    Protocol(String),
    #[error("no filesystem path known for project: {0}")]
    ProjectPathUnknown(String),
}

pub type PackageManagerResult<T> = Result<T, PackageManagerError>;
