use std::path::{Component, Path, PathBuf};

/// Result of resolving an archive entry name against the destination root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SanitizedPath {
    pub original: PathBuf,
    /// Normalized path below the root, after component stripping.
    pub relative: PathBuf,
    pub resolved: PathBuf,
}

/// The entry name is absolute or climbs above the destination root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Escape;

/// Resolve an entry name to a path inside `base`.
///
/// Returns `Ok(None)` when nothing is left to materialize: the name is empty
/// or `.`, or `strip_components` consumed every component.
pub fn sanitize_path(
    entry_path: &Path,
    base: &Path,
    strip_components: usize,
) -> Result<Option<SanitizedPath>, Escape> {
    let normalized = normalize_path(entry_path)?;
    let relative: PathBuf = normalized.components().skip(strip_components).collect();

    if relative.as_os_str().is_empty() {
        return Ok(None);
    }

    Ok(Some(SanitizedPath {
        original: entry_path.to_path_buf(),
        resolved: base.join(&relative),
        relative,
    }))
}

/// Lexically normalize a relative path, refusing anything that leaves it.
fn normalize_path(path: &Path) -> Result<PathBuf, Escape> {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Normal(part) => result.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    return Err(Escape);
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(Escape),
        }
    }

    Ok(result)
}
