//! # Path Resolution
//!
//! Turns raw file references found inside configuration documents into
//! absolute paths. Relative references are interpreted against the
//! directory of the document that contains them.

use std::path::{Component, Path, PathBuf};

/// Resolve `raw` against `base_dir`.
///
/// An absolute `raw` is returned unchanged. Otherwise it is joined onto
/// `base_dir` and anchored at the working directory if `base_dir` is itself
/// relative. The longest prefix of that path which exists is canonicalized
/// by the filesystem, so `..` after a symlinked directory lands in the
/// link target's parent. The remaining components do not exist and are
/// collapsed lexically. Never fails; whether the target exists is the
/// caller's concern.
pub fn resolve_ref(base_dir: &Path, raw: &str) -> PathBuf {
    let reference = Path::new(raw);
    if reference.is_absolute() {
        return reference.to_path_buf();
    }
    let joined = base_dir.join(reference);
    let anchored = if joined.is_absolute() {
        joined
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(joined),
            Err(_) => joined,
        }
    };
    canonicalize_existing_prefix(&anchored).unwrap_or_else(|| normalize(&anchored))
}

/// Directory a document lives in; `.` for a bare file name.
pub fn document_dir(document: &Path) -> PathBuf {
    match document.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// `None` if no prefix of `path` exists or it cannot be canonicalized.
fn canonicalize_existing_prefix(path: &Path) -> Option<PathBuf> {
    let prefix = path
        .ancestors()
        .find(|p| !p.as_os_str().is_empty() && p.exists())?;
    let base = prefix.canonicalize().ok()?;
    let rest = path.strip_prefix(prefix).ok()?;
    Some(push_normalized(base, rest))
}

fn normalize(path: &Path) -> PathBuf {
    push_normalized(PathBuf::new(), path)
}

fn push_normalized(mut out: PathBuf, path: &Path) -> PathBuf {
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` above the root stays at the root.
                if !out.pop() && !out.has_root() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
