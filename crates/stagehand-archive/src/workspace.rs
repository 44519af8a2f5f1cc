use std::io::Read;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{Error, Result};
use crate::extract::Unpacker;
use crate::options::UnpackOptions;
use crate::report::UnpackReport;

/// An unpack sitting in a staging directory next to its destination.
///
/// Dropping it without calling [`commit`](Self::commit) discards the staged
/// tree.
#[derive(Debug)]
pub struct StagedUnpack {
    staging: TempDir,
    destination: PathBuf,
    archive: PathBuf,
    report: UnpackReport,
}

impl StagedUnpack {
    /// Move the staged tree onto the destination.
    ///
    /// The destination must be absent or an empty directory.
    pub fn commit(self) -> Result<UnpackReport> {
        let Self {
            staging,
            destination,
            archive,
            mut report,
        } = self;
        let materialize = |source| Error::Materialize {
            archive: archive.clone(),
            path: destination.clone(),
            source,
        };

        if destination.is_dir() {
            std::fs::remove_dir(&destination).map_err(materialize)?;
        }

        // From here on the staging path is ours to clean up, not the guard's.
        let staging = staging.keep();
        if let Err(e) = std::fs::rename(&staging, &destination) {
            if let Err(cleanup) = std::fs::remove_dir_all(&staging) {
                tracing::warn!(
                    staging = %staging.display(),
                    error = %cleanup,
                    "failed to remove staging directory"
                );
            }
            return Err(materialize(e));
        }

        tracing::debug!(
            staging = %staging.display(),
            destination = %destination.display(),
            "committed staged unpack"
        );

        report.rebase(&staging, &destination);
        Ok(report)
    }

    pub fn abort(self) {
        drop(self);
    }

    pub fn report(&self) -> &UnpackReport {
        &self.report
    }

    pub fn staging_path(&self) -> &Path {
        self.staging.path()
    }
}

impl Unpacker {
    /// Unpack into a fresh staging directory beside `destination`.
    ///
    /// Staging on the same filesystem keeps the final [`StagedUnpack::commit`]
    /// a single rename.
    pub fn unpack_staged<R: Read>(&self, source: R, destination: &Path) -> Result<StagedUnpack> {
        let parent = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        stagehand_fs::ensure_dir(parent).map_err(|e| {
            let (path, source) = e.into_parts();
            Error::Materialize {
                archive: self.archive().to_path_buf(),
                path,
                source,
            }
        })?;

        let staging = tempfile::Builder::new()
            .prefix(".stagehand-")
            .tempdir_in(parent)
            .map_err(|e| Error::Materialize {
                archive: self.archive().to_path_buf(),
                path: parent.to_path_buf(),
                source: e,
            })?;

        let report = self.unpack(source, staging.path())?;

        Ok(StagedUnpack {
            staging,
            destination: destination.to_path_buf(),
            archive: self.archive().to_path_buf(),
            report,
        })
    }
}

/// Unpack `source` into a staging directory to be committed onto `destination`.
pub fn unpack_staged<R: Read>(
    source: R,
    destination: &Path,
    options: &UnpackOptions,
) -> Result<StagedUnpack> {
    Unpacker::new(*options).unpack_staged(source, destination)
}
