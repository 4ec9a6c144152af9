//! Containment validation for play-by-path requests.
//!
//! The play endpoints accept absolute paths from the client; the only
//! defense against traversal is checking that the resolved path stays
//! inside the owning media directory. Symlink escapes are out of scope.

use std::path::{Component, Path, PathBuf};

/// Resolve `path` to an absolute form without touching the filesystem.
/// `.` and `..` components are folded lexically; symlinks are left alone.
#[must_use]
pub fn lexical_absolute(path: &Path) -> PathBuf {
    let mut out = if path.is_absolute() {
        PathBuf::new()
    } else {
        std::env::current_dir().unwrap_or_default()
    };
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Return `true` when `candidate` resolves to `root` or to something
/// beneath it. Comparison is component-wise on the absolutized paths, so
/// a sibling like `/data/videos-evil` never matches root `/data/videos`.
#[must_use]
pub fn is_contained(candidate: &Path, root: &Path) -> bool {
    let candidate = lexical_absolute(candidate);
    let root = lexical_absolute(root);
    candidate.starts_with(&root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contained_paths_accepted() {
        assert!(is_contained(
            Path::new("/data/videos/a.mp4"),
            Path::new("/data/videos")
        ));
        assert!(is_contained(Path::new("/data/videos"), Path::new("/data/videos")));
        assert!(is_contained(
            Path::new("/data/videos/sub/a.mp4"),
            Path::new("/data/videos")
        ));
    }

    #[test]
    fn sibling_prefix_rejected() {
        assert!(!is_contained(
            Path::new("/data/videos-evil/a.mp4"),
            Path::new("/data/videos")
        ));
    }

    #[test]
    fn parent_traversal_rejected() {
        assert!(!is_contained(
            Path::new("/data/videos/../secrets/a.mp4"),
            Path::new("/data/videos")
        ));
        assert!(!is_contained(Path::new("/etc/passwd"), Path::new("/data/videos")));
    }

    #[test]
    fn dot_components_folded() {
        assert_eq!(
            lexical_absolute(Path::new("/data/videos/./a/../b.mp4")),
            PathBuf::from("/data/videos/b.mp4")
        );
    }

    #[test]
    fn relative_candidate_resolved_against_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(lexical_absolute(Path::new("x.mp4")), cwd.join("x.mp4"));
    }
}
