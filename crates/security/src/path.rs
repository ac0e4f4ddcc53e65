//! Path validation: filesystem sandboxing to the workspace directory.
//!
//! Every path a tool receives is untrusted. It is joined onto the workspace
//! root, normalized, and resolved through the filesystem (symlinks included);
//! the result must still sit under the canonical root.
//!
//! Containment is decided component by component with [`Path::starts_with`],
//! so a root of `/work` never admits a sibling such as `/work2/x`.

use std::path::{Component, Path, PathBuf};

/// Error returned when path validation fails.
#[derive(Debug, thiserror::Error)]
pub enum PathValidationError {
    #[error("Path '{path}' is outside the workspace")]
    OutsideWorkspace { path: String },

    #[error("Workspace root '{root}' is unusable: {reason}")]
    InvalidRoot { root: PathBuf, reason: String },
}

/// A canonicalized workspace root that file tools are confined to.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Canonicalize `root`. The directory must exist.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, PathValidationError> {
        let root = root.as_ref();
        let canonical = root
            .canonicalize()
            .map_err(|e| PathValidationError::InvalidRoot {
                root: root.to_path_buf(),
                reason: e.to_string(),
            })?;

        if !canonical.is_dir() {
            return Err(PathValidationError::InvalidRoot {
                root: root.to_path_buf(),
                reason: "not a directory".into(),
            });
        }

        Ok(Self { root: canonical })
    }

    /// The canonical root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `relative` against the root and confirm it stays inside.
    ///
    /// Returns the resolved absolute path, which is what callers must open;
    /// the raw input is never used for I/O.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, PathValidationError> {
        let normalized = normalize(&self.root.join(relative));
        match resolve_existing_prefix(&normalized) {
            Some(resolved) if resolved.starts_with(&self.root) => Ok(resolved),
            _ => {
                tracing::warn!(
                    path = %relative,
                    root = %self.root.display(),
                    "Rejected path outside workspace"
                );
                Err(PathValidationError::OutsideWorkspace {
                    path: relative.into(),
                })
            }
        }
    }

    /// Whether `relative` resolves inside the workspace.
    pub fn contains(&self, relative: &str) -> bool {
        self.resolve(relative).is_ok()
    }
}

/// Check that `relative`, resolved against `root`, stays inside `root`.
///
/// An unusable root makes every path unsafe.
pub fn is_safe(root: &Path, relative: &str) -> bool {
    Workspace::new(root).is_ok_and(|ws| ws.contains(relative))
}

/// Lexically drop `.` and fold `..` into its parent. Never climbs above the
/// filesystem root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Canonicalize the deepest ancestor that exists and re-attach the rest.
///
/// Targets that do not exist yet (a file about to be written) still get their
/// symlinked parents resolved. A re-attached component that is itself present
/// on disk is a dangling symlink whose target cannot be checked; `None`.
fn resolve_existing_prefix(path: &Path) -> Option<PathBuf> {
    let mut existing = path.to_path_buf();
    let mut remainder = Vec::new();

    loop {
        if let Ok(canonical) = existing.canonicalize() {
            let mut resolved = canonical;
            for part in remainder.iter().rev() {
                resolved.push(part);
                if resolved.symlink_metadata().is_ok() {
                    return None;
                }
            }
            return Some(resolved);
        }

        match (existing.file_name().map(|n| n.to_os_string()), existing.parent()) {
            (Some(name), Some(parent)) => {
                remainder.push(name);
                existing = parent.to_path_buf();
            }
            _ => return None,
        }
    }
}
