use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to create directory '{path}': {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to set permissions on '{path}': {source}")]
    SetPermissions { path: PathBuf, source: io::Error },

    #[error("failed to read metadata of '{path}': {source}")]
    Metadata { path: PathBuf, source: io::Error },
}

impl Error {
    /// The path the failed operation was working on.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::CreateDir { path, .. }
            | Self::SetPermissions { path, .. }
            | Self::Metadata { path, .. } => path,
        }
    }

    /// Split into the path and the underlying I/O error.
    pub fn into_parts(self) -> (PathBuf, io::Error) {
        match self {
            Self::CreateDir { path, source }
            | Self::SetPermissions { path, source }
            | Self::Metadata { path, source } => (path, source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
