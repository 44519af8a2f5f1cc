//! Streaming extraction of tar and tar.gz distribution archives.
//!
//! # Architecture
//!
//! - `format.rs` - Compression detection and the decompression filter
//! - `entry.rs` - Closed classification of archive entries
//! - `sanitize.rs` - Containment of entry names under the destination root
//! - `extract.rs` - The streaming extractor
//! - `workspace.rs` - Staged extraction with commit/abort
//! - `report.rs` - What a successful unpack produced

pub use entry::{ArchiveEntry, EntryKind};
pub use error::{Error, Result};
pub use extract::{
    STREAM_LABEL, Unpacker, detect_file, unpack, unpack_file, unpack_file_detect,
};
pub use format::Compression;
pub use options::UnpackOptions;
pub use report::{Outcome, SkipReason, UnpackReport, UnpackedEntry};
pub use sanitize::{SanitizedPath, sanitize_path};
pub use workspace::{StagedUnpack, unpack_staged};

pub use stagehand_fs::{PermissionSet, PosixPermission};

pub mod entry;
mod error;
pub mod extract;
pub mod format;
pub mod options;
pub mod report;
pub mod sanitize;
mod workspace;
