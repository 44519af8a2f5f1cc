use std::path::PathBuf;

use stagehand_fs::PermissionSet;

/// What an archive entry materializes as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    RegularFile,
    /// Symlinks, hard links, devices, fifos, sparse files. Never materialized.
    Other { type_flag: u8 },
}

impl EntryKind {
    pub fn from_tar(entry_type: tar::EntryType) -> Self {
        if entry_type.is_dir() {
            Self::Directory
        } else if entry_type.is_file() || entry_type.is_contiguous() {
            Self::RegularFile
        } else {
            Self::Other {
                type_flag: entry_type.as_byte(),
            }
        }
    }

    /// Classify from the type flag and the raw header name.
    ///
    /// Pre-POSIX writers mark directories only by a trailing `/` on a
    /// regular-typed entry.
    pub fn from_header(entry_type: tar::EntryType, name: &[u8]) -> Self {
        match Self::from_tar(entry_type) {
            Self::RegularFile if name.ends_with(b"/") => Self::Directory,
            kind => kind,
        }
    }

    pub fn is_directory(self) -> bool {
        self == Self::Directory
    }

    pub fn is_file(self) -> bool {
        self == Self::RegularFile
    }

    /// Short human name, used in logs.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::RegularFile => "file",
            Self::Other { type_flag: b'1' } => "hard link",
            Self::Other { type_flag: b'2' } => "symlink",
            Self::Other { type_flag: b'3' } => "character device",
            Self::Other { type_flag: b'4' } => "block device",
            Self::Other { type_flag: b'6' } => "fifo",
            Self::Other { .. } => "unsupported entry",
        }
    }
}

/// Header fields of one entry, detached from the stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: PathBuf,
    pub kind: EntryKind,
    pub mode: u32,
    pub size: u64,
}

impl ArchiveEntry {
    pub fn new(name: PathBuf, kind: EntryKind, mode: u32, size: u64) -> Self {
        Self {
            name,
            kind,
            mode,
            size,
        }
    }

    /// The nine permission bits of the entry's mode.
    pub fn permissions(&self) -> PermissionSet {
        PermissionSet::from_mode(self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_fs::PosixPermission;

    #[test]
    fn classify_tar_types() {
        assert_eq!(EntryKind::from_tar(tar::EntryType::Directory), EntryKind::Directory);
        assert_eq!(EntryKind::from_tar(tar::EntryType::Regular), EntryKind::RegularFile);
        assert_eq!(
            EntryKind::from_tar(tar::EntryType::Symlink),
            EntryKind::Other { type_flag: b'2' }
        );
        assert_eq!(
            EntryKind::from_tar(tar::EntryType::Link),
            EntryKind::Other { type_flag: b'1' }
        );
        assert_eq!(
            EntryKind::from_tar(tar::EntryType::Fifo),
            EntryKind::Other { type_flag: b'6' }
        );
        assert_eq!(EntryKind::from_tar(tar::EntryType::Continuous), EntryKind::RegularFile);
        assert_eq!(EntryKind::from_tar(tar::EntryType::new(b'\0')), EntryKind::RegularFile);
    }

    #[test]
    fn trailing_slash_marks_legacy_directory() {
        assert_eq!(
            EntryKind::from_header(tar::EntryType::Regular, b"legacy/"),
            EntryKind::Directory
        );
        assert_eq!(
            EntryKind::from_header(tar::EntryType::Continuous, b"legacy/"),
            EntryKind::Directory
        );
        assert_eq!(
            EntryKind::from_header(tar::EntryType::Regular, b"legacy/a.txt"),
            EntryKind::RegularFile
        );
        assert_eq!(
            EntryKind::from_header(tar::EntryType::Symlink, b"link/"),
            EntryKind::Other { type_flag: b'2' }
        );
    }

    #[test]
    fn describe_kinds() {
        assert_eq!(EntryKind::Directory.describe(), "directory");
        assert_eq!(EntryKind::Other { type_flag: b'2' }.describe(), "symlink");
        assert_eq!(EntryKind::Other { type_flag: b'S' }.describe(), "unsupported entry");
    }

    #[test]
    fn entry_permissions_ignore_type_bits() {
        let entry = ArchiveEntry::new(
            PathBuf::from("bin/run.sh"),
            EntryKind::RegularFile,
            0o100755,
            18,
        );
        let perms = entry.permissions();
        assert_eq!(perms.to_mode(), 0o755);
        assert!(perms.contains(PosixPermission::OthersExecute));
        assert!(entry.kind.is_file());
        assert!(!entry.kind.is_directory());
    }
}
