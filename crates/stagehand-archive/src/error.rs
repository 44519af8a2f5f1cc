use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to open archive '{archive}': {source}")]
    StreamOpen { archive: PathBuf, source: io::Error },

    #[error("unsupported archive format in '{archive}'")]
    UnsupportedFormat { archive: PathBuf },

    #[error("failed to read {} from archive '{archive}': {source}", describe_entry(.entry))]
    EntryIo {
        archive: PathBuf,
        entry: Option<PathBuf>,
        /// Where the entry was being written, when the copy had started.
        path: Option<PathBuf>,
        source: io::Error,
    },

    #[error("entry '{entry}' in archive '{archive}' escapes the destination root")]
    PathEscape { archive: PathBuf, entry: PathBuf },

    #[error("failed to materialize '{path}' from archive '{archive}': {source}")]
    Materialize {
        archive: PathBuf,
        path: PathBuf,
        source: io::Error,
    },

    #[error("failed to apply permissions to '{path}' from archive '{archive}': {source}")]
    PermissionApply {
        archive: PathBuf,
        path: PathBuf,
        source: stagehand_fs::Error,
    },
}

fn describe_entry(entry: &Option<PathBuf>) -> String {
    match entry {
        Some(entry) => format!("entry '{}'", entry.display()),
        None => "entry header".to_string(),
    }
}

impl Error {
    /// The archive the failing extraction was reading.
    pub fn archive(&self) -> &std::path::Path {
        match self {
            Self::StreamOpen { archive, .. }
            | Self::UnsupportedFormat { archive }
            | Self::EntryIo { archive, .. }
            | Self::PathEscape { archive, .. }
            | Self::Materialize { archive, .. }
            | Self::PermissionApply { archive, .. } => archive,
        }
    }

    /// The destination path involved, when the failure happened on disk.
    pub fn destination(&self) -> Option<&std::path::Path> {
        match self {
            Self::Materialize { path, .. } | Self::PermissionApply { path, .. } => Some(path),
            Self::EntryIo { path, .. } => path.as_deref(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_io_message_names_entry() {
        let err = Error::EntryIo {
            archive: PathBuf::from("dist.tgz"),
            entry: Some(PathBuf::from("bin/run.sh")),
            path: Some(PathBuf::from("/out/bin/run.sh")),
            source: io::Error::new(io::ErrorKind::UnexpectedEof, "truncated"),
        };
        assert_eq!(
            err.to_string(),
            "failed to read entry 'bin/run.sh' from archive 'dist.tgz': truncated"
        );
        assert_eq!(err.archive(), std::path::Path::new("dist.tgz"));
        assert_eq!(err.destination(), Some(std::path::Path::new("/out/bin/run.sh")));
    }

    #[test]
    fn entry_io_message_without_entry() {
        let err = Error::EntryIo {
            archive: PathBuf::from("dist.tgz"),
            entry: None,
            path: None,
            source: io::Error::other("bad checksum"),
        };
        assert!(err.to_string().contains("entry header"));
        assert!(err.destination().is_none());
    }

    #[test]
    fn materialize_exposes_destination() {
        let err = Error::Materialize {
            archive: PathBuf::from("dist.tgz"),
            path: PathBuf::from("/out/bin"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.destination(), Some(std::path::Path::new("/out/bin")));
    }
}
