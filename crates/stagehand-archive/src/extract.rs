//! Streaming tar extraction.
//!
//! # Platform Behavior
//!
//! **Unix**: the nine permission bits of every regular file entry are applied
//! to the written file, exactly, regardless of the process umask.
//!
//! **Other platforms**: there is no POSIX permission view, so permission
//! application is skipped without error.
//!
//! Directory entries never have their mode applied; they are created with
//! default permissions.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use stagehand_fs::PermissionSet;

use crate::entry::{ArchiveEntry, EntryKind};
use crate::error::{Error, Result};
use crate::format::{self, Compression};
use crate::options::{DEFAULT_BUFFER_SIZE, UnpackOptions};
use crate::report::{Outcome, SkipReason, UnpackReport};
use crate::sanitize::{Escape, sanitize_path};

/// Label used in errors when the caller hands over a bare stream.
pub const STREAM_LABEL: &str = "<stream>";

/// Unpack a tar stream into `destination`, gunzipping it first if `compressed`.
///
/// `destination` is created if missing. Extraction is not transactional: on
/// failure, entries written before the failing one stay on disk.
pub fn unpack<R: Read>(source: R, destination: &Path, compressed: bool) -> Result<UnpackReport> {
    Unpacker::new(UnpackOptions::default().compressed(compressed)).unpack(source, destination)
}

/// Open `archive` and unpack it with the given options.
pub fn unpack_file(
    archive: &Path,
    destination: &Path,
    options: &UnpackOptions,
) -> Result<UnpackReport> {
    let file = File::open(archive).map_err(|e| Error::StreamOpen {
        archive: archive.to_path_buf(),
        source: e,
    })?;
    Unpacker::new(*options)
        .archive_label(archive)
        .unpack(file, destination)
}

/// Open `archive`, work out its compression, and unpack it.
///
/// The magic bytes decide; the file extension is only consulted when they are
/// inconclusive. `options.compression` is overwritten.
pub fn unpack_file_detect(
    archive: &Path,
    destination: &Path,
    options: &UnpackOptions,
) -> Result<UnpackReport> {
    let (compression, reader) = open_detected(archive, options.buffer_size)?;

    Unpacker::new(options.compression(compression))
        .archive_label(archive)
        .unpack(reader, destination)
}

/// Work out the compression of the archive at `archive` without unpacking it.
///
/// Same rules as [`unpack_file_detect`].
pub fn detect_file(archive: &Path) -> Result<Compression> {
    open_detected(archive, DEFAULT_BUFFER_SIZE).map(|(compression, _)| compression)
}

fn open_detected(archive: &Path, buffer_size: usize) -> Result<(Compression, BufReader<File>)> {
    let open_error = |source| Error::StreamOpen {
        archive: archive.to_path_buf(),
        source,
    };

    let file = File::open(archive).map_err(open_error)?;
    let mut reader = BufReader::with_capacity(buffer_size.max(512), file);

    let compression = format::detect_from_reader(&mut reader)
        .map_err(open_error)?
        .or_else(|| Compression::from_extension(archive))
        .ok_or_else(|| Error::UnsupportedFormat {
            archive: archive.to_path_buf(),
        })?;

    tracing::debug!(archive = %archive.display(), ?compression, "detected compression");

    Ok((compression, reader))
}

/// Reusable extraction settings.
///
/// Holds no state between calls; one `Unpacker` may serve any number of
/// sequential or concurrent extractions into disjoint destinations.
#[derive(Clone, Debug)]
pub struct Unpacker {
    options: UnpackOptions,
    archive: PathBuf,
}

impl Default for Unpacker {
    fn default() -> Self {
        Self::new(UnpackOptions::default())
    }
}

impl Unpacker {
    pub fn new(options: UnpackOptions) -> Self {
        Self {
            options,
            archive: PathBuf::from(STREAM_LABEL),
        }
    }

    /// Name the archive in error messages and logs.
    pub fn archive_label(mut self, archive: impl Into<PathBuf>) -> Self {
        self.archive = archive.into();
        self
    }

    pub fn options(&self) -> &UnpackOptions {
        &self.options
    }

    pub(crate) fn archive(&self) -> &Path {
        &self.archive
    }

    /// Stream every entry of `source` into `destination`.
    #[tracing::instrument(
        skip_all,
        fields(archive = %self.archive.display(), destination = %destination.display())
    )]
    pub fn unpack<R: Read>(&self, source: R, destination: &Path) -> Result<UnpackReport> {
        let compression = self.options.compression;
        let mut reader = BufReader::with_capacity(self.options.buffer_size, source);

        if compression == Compression::Gzip {
            self.check_gzip_magic(&mut reader)?;
        }

        let mut archive = tar::Archive::new(compression.decoder(reader));

        stagehand_fs::ensure_dir(destination).map_err(|e| self.materialize_error(e))?;

        let entries = archive.entries().map_err(|e| self.entry_error(None, e))?;
        let mut buffer = vec![0u8; self.options.buffer_size];
        let mut report = UnpackReport::new(compression);

        for entry in entries {
            let mut entry = entry.map_err(|e| self.entry_error(None, e))?;
            let header = self.read_header(&entry)?;
            let outcome = self.materialize(&header, &mut entry, destination, &mut buffer)?;
            report.record(header, outcome);
        }

        tracing::debug!(
            directories = report.directories,
            files = report.files,
            skipped = report.skipped,
            bytes = report.total_bytes,
            "unpack finished"
        );

        Ok(report)
    }

    fn check_gzip_magic<R: Read>(&self, reader: &mut BufReader<R>) -> Result<()> {
        let head = reader.fill_buf().map_err(|e| self.open_error(e))?;
        if head.len() < 2 || head.starts_with(&[0x1F, 0x8B]) {
            return Ok(());
        }
        Err(self.open_error(io::Error::new(
            io::ErrorKind::InvalidData,
            "stream does not start with a gzip header",
        )))
    }

    fn read_header<R: Read>(&self, entry: &tar::Entry<'_, R>) -> Result<ArchiveEntry> {
        let name = entry
            .path()
            .map_err(|e| self.entry_error(None, e))?
            .into_owned();
        let header = entry.header();
        let kind = EntryKind::from_header(header.entry_type(), &entry.path_bytes());
        let mode = header
            .mode()
            .map_err(|e| self.entry_error(Some(&name), e))?;

        Ok(ArchiveEntry::new(name, kind, mode, entry.size()))
    }

    fn materialize(
        &self,
        header: &ArchiveEntry,
        content: &mut impl Read,
        destination: &Path,
        buffer: &mut [u8],
    ) -> Result<Outcome> {
        match header.kind {
            EntryKind::Directory => {
                let Some(target) = self.resolve(header, destination)? else {
                    return Ok(Outcome::Skipped(SkipReason::EmptyPath));
                };
                stagehand_fs::ensure_dir(&target).map_err(|e| self.materialize_error(e))?;
                tracing::debug!(path = %target.display(), "created directory");
                Ok(Outcome::Directory(target))
            }
            EntryKind::RegularFile => {
                let Some(target) = self.resolve(header, destination)? else {
                    return Ok(Outcome::Skipped(SkipReason::EmptyPath));
                };
                self.write_file(header, content, &target, buffer)?;
                Ok(Outcome::File(target))
            }
            EntryKind::Other { .. } => {
                tracing::warn!(
                    entry = %header.name.display(),
                    kind = header.kind.describe(),
                    "skipping entry of unsupported kind"
                );
                Ok(Outcome::Skipped(SkipReason::UnsupportedKind))
            }
        }
    }

    fn resolve(&self, header: &ArchiveEntry, destination: &Path) -> Result<Option<PathBuf>> {
        match sanitize_path(&header.name, destination, self.options.strip_components) {
            Ok(Some(sanitized)) => Ok(Some(sanitized.resolved)),
            Ok(None) => {
                tracing::debug!(entry = %header.name.display(), "nothing left to materialize");
                Ok(None)
            }
            Err(Escape) => Err(Error::PathEscape {
                archive: self.archive.clone(),
                entry: header.name.clone(),
            }),
        }
    }

    fn write_file(
        &self,
        header: &ArchiveEntry,
        content: &mut impl Read,
        target: &Path,
        buffer: &mut [u8],
    ) -> Result<()> {
        stagehand_fs::ensure_parent(target).map_err(|e| self.materialize_error(e))?;

        // A previous run may have left a read-only file here.
        if let Ok(existing) = std::fs::symlink_metadata(target) {
            if !existing.is_dir() {
                std::fs::remove_file(target).map_err(|e| self.io_materialize_error(target, e))?;
            }
        }

        let file = File::create(target).map_err(|e| self.io_materialize_error(target, e))?;
        let mut sink = BufWriter::new(file);

        let mut copied = 0u64;
        loop {
            let n = match content.read(buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.copy_error(header, target, e)),
            };
            sink.write_all(&buffer[..n])
                .map_err(|e| self.io_materialize_error(target, e))?;
            copied += n as u64;
        }

        if copied != header.size {
            return Err(self.copy_error(
                header,
                target,
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("expected {} bytes, got {copied}", header.size),
                ),
            ));
        }

        let file = sink
            .into_inner()
            .map_err(|e| self.io_materialize_error(target, e.into_error()))?;
        drop(file);

        let permissions = self.apply_permissions(header, target)?;

        tracing::debug!(
            path = %target.display(),
            bytes = copied,
            mode = %permissions,
            "wrote file"
        );

        Ok(())
    }

    fn apply_permissions(&self, header: &ArchiveEntry, target: &Path) -> Result<PermissionSet> {
        let permissions = header.permissions();
        permissions
            .apply_to_path(target)
            .map_err(|e| Error::PermissionApply {
                archive: self.archive.clone(),
                path: target.to_path_buf(),
                source: e,
            })?;
        Ok(permissions)
    }

    fn open_error(&self, source: io::Error) -> Error {
        Error::StreamOpen {
            archive: self.archive.clone(),
            source,
        }
    }

    fn entry_error(&self, entry: Option<&Path>, source: io::Error) -> Error {
        Error::EntryIo {
            archive: self.archive.clone(),
            entry: entry.map(Path::to_path_buf),
            path: None,
            source,
        }
    }

    fn copy_error(&self, header: &ArchiveEntry, target: &Path, source: io::Error) -> Error {
        Error::EntryIo {
            archive: self.archive.clone(),
            entry: Some(header.name.clone()),
            path: Some(target.to_path_buf()),
            source,
        }
    }

    fn materialize_error(&self, error: stagehand_fs::Error) -> Error {
        let (path, source) = error.into_parts();
        Error::Materialize {
            archive: self.archive.clone(),
            path,
            source,
        }
    }

    fn io_materialize_error(&self, path: &Path, source: io::Error) -> Error {
        Error::Materialize {
            archive: self.archive.clone(),
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn tar_with_file(name: &str, mode: u32, data: &[u8]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(mode);
        header.set_entry_type(tar::EntryType::Regular);
        builder.append_data(&mut header, name, data).unwrap();
        builder.into_inner().unwrap()
    }

    #[test]
    fn unpack_plain_stream() {
        let dir = tempfile::tempdir().unwrap();
        let data = tar_with_file("hello.txt", 0o644, b"hi");

        let report = unpack(Cursor::new(data), dir.path(), false).unwrap();

        assert_eq!(report.files, 1);
        assert_eq!(std::fs::read(dir.path().join("hello.txt")).unwrap(), b"hi");
    }

    #[test]
    fn gzip_flag_on_plain_stream_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let data = tar_with_file("hello.txt", 0o644, b"hi");

        let err = unpack(Cursor::new(data), dir.path(), true).unwrap_err();

        assert!(matches!(err, Error::StreamOpen { .. }));
        assert_eq!(err.archive(), Path::new(STREAM_LABEL));
        assert!(!dir.path().join("hello.txt").exists());
    }

    #[test]
    fn empty_stream_is_an_empty_archive() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out");

        let report = unpack(Cursor::new(Vec::new()), &dest, false).unwrap();

        assert_eq!(report.entry_count(), 0);
        assert!(dest.is_dir());
    }

    #[test]
    fn tiny_buffer_still_copies_everything() {
        let dir = tempfile::tempdir().unwrap();
        let content: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let data = tar_with_file("blob.bin", 0o600, &content);

        Unpacker::new(UnpackOptions::default().buffer_size(7))
            .unpack(Cursor::new(data), dir.path())
            .unwrap();

        assert_eq!(std::fs::read(dir.path().join("blob.bin")).unwrap(), content);
    }

    #[test]
    fn archive_label_appears_in_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = Unpacker::new(UnpackOptions::default().compressed(true))
            .archive_label("dist/broker.tgz")
            .unpack(Cursor::new(b"not gzip".to_vec()), dir.path())
            .unwrap_err();

        assert_eq!(err.archive(), Path::new("dist/broker.tgz"));
        assert!(err.to_string().contains("dist/broker.tgz"));
    }

    #[cfg(unix)]
    #[test]
    fn permission_failure_maps_to_permission_apply() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("vanished.sh");
        let header = ArchiveEntry::new(
            PathBuf::from("bin/vanished.sh"),
            EntryKind::RegularFile,
            0o755,
            0,
        );

        let err = Unpacker::default()
            .archive_label("dist.tgz")
            .apply_permissions(&header, &missing)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::PermissionApply {
                source: stagehand_fs::Error::SetPermissions { .. },
                ..
            }
        ));
        assert_eq!(err.destination(), Some(missing.as_path()));
        assert_eq!(err.archive(), Path::new("dist.tgz"));
    }

    #[test]
    fn short_copy_names_destination() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("libs/broker.jar");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        let header = ArchiveEntry::new(
            PathBuf::from("libs/broker.jar"),
            EntryKind::RegularFile,
            0o644,
            10,
        );
        let mut buffer = [0u8; 4];

        let err = Unpacker::default()
            .write_file(&header, &mut &b"abc"[..], &target, &mut buffer)
            .unwrap_err();

        match &err {
            Error::EntryIo { entry, source, .. } => {
                assert_eq!(entry.as_deref(), Some(Path::new("libs/broker.jar")));
                assert_eq!(source.kind(), io::ErrorKind::UnexpectedEof);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.destination(), Some(target.as_path()));
    }

    #[test]
    fn detect_file_reports_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, "plain text").unwrap();

        let err = detect_file(&notes).unwrap_err();

        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }

    #[test]
    fn unpack_file_missing_archive() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.tgz");

        let err = unpack_file(&missing, dir.path(), &UnpackOptions::default()).unwrap_err();

        assert!(matches!(err, Error::StreamOpen { .. }));
        assert_eq!(err.archive(), missing.as_path());
    }
}
