use std::path::{Path, PathBuf};

use crate::entry::ArchiveEntry;
use crate::format::Compression;

/// Why an entry left nothing on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Symlink, hard link, device and so on.
    UnsupportedKind,
    /// The name was empty, `.`, or fully stripped away.
    EmptyPath,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Directory(PathBuf),
    File(PathBuf),
    Skipped(SkipReason),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnpackedEntry {
    pub entry: ArchiveEntry,
    pub outcome: Outcome,
}

impl UnpackedEntry {
    pub fn target(&self) -> Option<&Path> {
        match &self.outcome {
            Outcome::Directory(path) | Outcome::File(path) => Some(path),
            Outcome::Skipped(_) => None,
        }
    }
}

/// Summary of a successful unpack, in archive order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnpackReport {
    pub compression: Compression,
    pub directories: usize,
    pub files: usize,
    pub skipped: usize,
    pub total_bytes: u64,
    pub entries: Vec<UnpackedEntry>,
}

impl UnpackReport {
    pub fn new(compression: Compression) -> Self {
        Self {
            compression,
            ..Self::default()
        }
    }

    pub(crate) fn record(&mut self, entry: ArchiveEntry, outcome: Outcome) {
        match &outcome {
            Outcome::Directory(_) => self.directories += 1,
            Outcome::File(_) => {
                self.files += 1;
                self.total_bytes += entry.size;
            }
            Outcome::Skipped(_) => self.skipped += 1,
        }
        self.entries.push(UnpackedEntry { entry, outcome });
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Look an entry up by its name as stored in the archive.
    pub fn find(&self, name: impl AsRef<Path>) -> Option<&UnpackedEntry> {
        let name = name.as_ref();
        self.entries.iter().find(|e| e.entry.name == name)
    }

    /// Move every recorded target from one root to another.
    pub(crate) fn rebase(&mut self, from: &Path, to: &Path) {
        for unpacked in &mut self.entries {
            let (Outcome::Directory(path) | Outcome::File(path)) = &mut unpacked.outcome else {
                continue;
            };
            if let Ok(relative) = path.strip_prefix(from) {
                *path = to.join(relative);
            }
        }
    }
}
