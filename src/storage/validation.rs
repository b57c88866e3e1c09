//! Path validation
//!
//! Resolves principal-relative paths into absolute paths and enforces the
//! sandbox boundary. Resolution is purely lexical; no filesystem access happens here.

use std::path::{Component, Path, PathBuf};

use crate::error::StorageError;
use crate::storage::principal::Principal;

/// A path that has passed the sandbox check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Absolute (or root-relative, if the storage root is relative) host path
    pub absolute: PathBuf,
    /// Normalized forward-slash path relative to the principal root; empty for the root itself
    pub relative: String,
}

impl ResolvedPath {
    pub fn is_root(&self) -> bool {
        self.relative.is_empty()
    }

    /// Base name of the entry; empty for the root itself
    pub fn name(&self) -> &str {
        self.relative.rsplit('/').next().unwrap_or("")
    }
}

/// Maps (principal, relative path) pairs onto the host filesystem
#[derive(Debug, Clone)]
pub struct PathResolver {
    files_root: PathBuf,
}

impl PathResolver {
    /// `files_root` is the directory holding every principal root
    pub fn new(files_root: &Path) -> Self {
        Self {
            files_root: normalize(files_root),
        }
    }

    /// Root directory of one principal
    pub fn principal_root(&self, principal: &Principal) -> PathBuf {
        self.files_root.join(principal.id())
    }

    /// Join `segments` onto the principal's root and reject anything that leaves it
    pub fn resolve(
        &self,
        principal: &Principal,
        segments: &[&str],
    ) -> Result<ResolvedPath, StorageError> {
        let root = self.principal_root(principal);
        let display = segments.join("/");

        let mut joined = root.clone();
        for segment in segments {
            if segment.contains('\0') {
                return Err(StorageError::InvalidPath(display));
            }
            for part in segment.split('/') {
                // Each part is pushed as a plain name so that a drive prefix or a
                // leading separator can never reset the join to another root.
                match part {
                    "" | "." => {}
                    ".." => joined.push(".."),
                    name if is_plain_name(name) => joined.push(name),
                    _ => return Err(StorageError::InvalidPath(display)),
                }
            }
        }

        let absolute = normalize(&joined);
        let relative = match absolute.strip_prefix(&root) {
            Ok(rel) => rel,
            Err(_) => return Err(StorageError::InvalidPath(display)),
        };

        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        Ok(ResolvedPath { absolute, relative })
    }
}

fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none()
}

/// Lexically resolve `.` and `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> PathResolver {
        PathResolver::new(Path::new("/srv/drive/files"))
    }

    fn alice() -> Principal {
        Principal::new("alice").unwrap()
    }

    #[test]
    fn empty_path_is_root() {
        let resolved = resolver().resolve(&alice(), &[""]).unwrap();
        assert_eq!(resolved.absolute, PathBuf::from("/srv/drive/files/alice"));
        assert!(resolved.is_root());
        assert_eq!(resolved.name(), "");

        let resolved = resolver().resolve(&alice(), &[]).unwrap();
        assert!(resolved.is_root());
    }

    #[test]
    fn joins_and_normalizes() {
        let resolved = resolver()
            .resolve(&alice(), &["docs//./reports/../a.txt"])
            .unwrap();
        assert_eq!(
            resolved.absolute,
            PathBuf::from("/srv/drive/files/alice/docs/a.txt")
        );
        assert_eq!(resolved.relative, "docs/a.txt");
        assert_eq!(resolved.name(), "a.txt");
    }

    #[test]
    fn joins_multiple_segments() {
        let resolved = resolver().resolve(&alice(), &["docs", "a.txt"]).unwrap();
        assert_eq!(resolved.relative, "docs/a.txt");
    }

    #[test]
    fn leading_slash_stays_inside_root() {
        let resolved = resolver().resolve(&alice(), &["/etc/passwd"]).unwrap();
        assert_eq!(
            resolved.absolute,
            PathBuf::from("/srv/drive/files/alice/etc/passwd")
        );
    }

    #[test]
    fn rejects_traversal() {
        for bad in [
            "..",
            "../../etc/passwd",
            "docs/../../bob",
            "a/b/../../../..",
            "x\0y",
        ] {
            let err = resolver().resolve(&alice(), &[bad]).unwrap_err();
            assert!(
                matches!(err, StorageError::InvalidPath(_)),
                "{bad:?} resolved to {err:?}"
            );
        }
    }

    #[test]
    fn traversal_back_into_own_root_is_allowed() {
        let resolved = resolver().resolve(&alice(), &["../alice/docs"]).unwrap();
        assert_eq!(resolved.relative, "docs");
    }

    #[test]
    fn traversal_is_checked_across_segments() {
        let err = resolver().resolve(&alice(), &["docs", "../.."]).unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath(_)));
    }

    #[test]
    fn resolved_paths_never_leave_root() {
        let root = resolver().principal_root(&alice());
        let parts = ["..", ".", "a", "b", "", "alice", "files"];
        // Every path of up to four parts either stays under the root or is rejected.
        for a in parts {
            for b in parts {
                for c in parts {
                    for d in parts {
                        let input = format!("{a}/{b}/{c}/{d}");
                        if let Ok(resolved) = resolver().resolve(&alice(), &[input.as_str()]) {
                            assert!(resolved.absolute.starts_with(&root), "{input}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn relative_storage_root_is_normalized() {
        let resolver = PathResolver::new(Path::new("./data/../storage/files"));
        let resolved = resolver.resolve(&alice(), &["a.txt"]).unwrap();
        assert_eq!(resolved.absolute, PathBuf::from("storage/files/alice/a.txt"));
    }
}
