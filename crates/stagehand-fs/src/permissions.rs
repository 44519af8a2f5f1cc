use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use crate::{Error, Result};

/// Mask of the nine permission bits; everything above it is ignored.
pub const PERMISSION_MASK: u32 = 0o777;

/// One of the nine symbolic POSIX permissions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PosixPermission {
    OwnerRead,
    OwnerWrite,
    OwnerExecute,
    GroupRead,
    GroupWrite,
    GroupExecute,
    OthersRead,
    OthersWrite,
    OthersExecute,
}

/// Fixed bit-to-symbol table, ordered from the most significant bit down.
const TABLE: [(u32, PosixPermission); 9] = [
    (0o400, PosixPermission::OwnerRead),
    (0o200, PosixPermission::OwnerWrite),
    (0o100, PosixPermission::OwnerExecute),
    (0o040, PosixPermission::GroupRead),
    (0o020, PosixPermission::GroupWrite),
    (0o010, PosixPermission::GroupExecute),
    (0o004, PosixPermission::OthersRead),
    (0o002, PosixPermission::OthersWrite),
    (0o001, PosixPermission::OthersExecute),
];

impl PosixPermission {
    pub const ALL: [PosixPermission; 9] = [
        Self::OwnerRead,
        Self::OwnerWrite,
        Self::OwnerExecute,
        Self::GroupRead,
        Self::GroupWrite,
        Self::GroupExecute,
        Self::OthersRead,
        Self::OthersWrite,
        Self::OthersExecute,
    ];

    /// The octal bit this permission occupies in a mode.
    pub fn bit(self) -> u32 {
        TABLE
            .iter()
            .find(|(_, permission)| *permission == self)
            .map(|(bit, _)| *bit)
            .unwrap_or(0)
    }

    fn symbol(self) -> char {
        match self {
            Self::OwnerRead | Self::GroupRead | Self::OthersRead => 'r',
            Self::OwnerWrite | Self::GroupWrite | Self::OthersWrite => 'w',
            Self::OwnerExecute | Self::GroupExecute | Self::OthersExecute => 'x',
        }
    }
}

/// A set of symbolic POSIX permissions.
///
/// Converts exactly to and from the low nine bits of a Unix mode:
/// `PermissionSet::from_mode(m).to_mode() == m & 0o777` for every `m`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PermissionSet {
    permissions: BTreeSet<PosixPermission>,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the set from a mode, looking only at the permission bits.
    ///
    /// # Examples
    /// ```
    /// use stagehand_fs::permissions::{PermissionSet, PosixPermission};
    ///
    /// let set = PermissionSet::from_mode(0o100644);
    /// assert!(set.contains(PosixPermission::OwnerWrite));
    /// assert!(!set.contains(PosixPermission::OwnerExecute));
    /// assert_eq!(set.to_mode(), 0o644);
    /// ```
    pub fn from_mode(mode: u32) -> Self {
        TABLE
            .iter()
            .filter(|(bit, _)| mode & bit == *bit)
            .map(|(_, permission)| *permission)
            .collect()
    }

    /// OR together the bit of every permission present.
    pub fn to_mode(&self) -> u32 {
        TABLE
            .iter()
            .filter(|(_, permission)| self.permissions.contains(permission))
            .fold(0, |mode, (bit, _)| mode | bit)
    }

    pub fn insert(&mut self, permission: PosixPermission) -> bool {
        self.permissions.insert(permission)
    }

    pub fn remove(&mut self, permission: PosixPermission) -> bool {
        self.permissions.remove(&permission)
    }

    pub fn contains(&self, permission: PosixPermission) -> bool {
        self.permissions.contains(&permission)
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = PosixPermission> + '_ {
        self.permissions.iter().copied()
    }

    /// True when any of owner, group or others may execute.
    pub fn is_executable(&self) -> bool {
        self.contains(PosixPermission::OwnerExecute)
            || self.contains(PosixPermission::GroupExecute)
            || self.contains(PosixPermission::OthersExecute)
    }

    /// Set exactly these permission bits on `path`.
    ///
    /// # Platform Behavior
    /// - **Unix**: Sets mode bits via `PermissionsExt::from_mode()`
    /// - **Other platforms**: No POSIX permission view exists, nothing is done
    ///
    /// # Errors
    /// Returns [`Error::SetPermissions`] if the path does not exist or the
    /// mode cannot be changed.
    pub fn apply_to_path(&self, path: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(self.to_mode());
            std::fs::set_permissions(path, perms).map_err(|e| Error::SetPermissions {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        #[cfg(not(unix))]
        let _ = path;

        Ok(())
    }

    /// Read the permission bits currently set on `path`.
    ///
    /// Returns `Ok(None)` on platforms without POSIX permissions.
    pub fn read_from_path(path: &Path) -> Result<Option<Self>> {
        let metadata = std::fs::metadata(path).map_err(|e| Error::Metadata {
            path: path.to_path_buf(),
            source: e,
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            Ok(Some(Self::from_mode(metadata.permissions().mode())))
        }

        #[cfg(not(unix))]
        {
            let _ = metadata;
            Ok(None)
        }
    }
}

impl FromIterator<PosixPermission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = PosixPermission>>(iter: I) -> Self {
        Self {
            permissions: iter.into_iter().collect(),
        }
    }
}

impl<const N: usize> From<[PosixPermission; N]> for PermissionSet {
    fn from(permissions: [PosixPermission; N]) -> Self {
        permissions.into_iter().collect()
    }
}

impl From<u32> for PermissionSet {
    fn from(mode: u32) -> Self {
        Self::from_mode(mode)
    }
}

/// Renders as `ls -l` does, e.g. `rwxr-xr-x`.
impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (_, permission) in TABLE {
            let c = if self.contains(permission) {
                permission.symbol()
            } else {
                '-'
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}
