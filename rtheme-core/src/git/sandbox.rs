//! Confinement of file reads to a checkout directory
//!
//! A path is resolved against the root, canonicalized (symlinks and `..`
//! fully resolved) and accepted only if the result still lies under the
//! canonical root.

use std::io;
use std::path::{Path, PathBuf};

/// Turns a path into its canonical, absolute form
pub trait PathResolver {
    /// Canonicalize `path`, failing if it does not exist
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}

/// Resolver backed by the real filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsResolver;

impl PathResolver for FsResolver {
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }
}

/// Resolve `relative` against `root` and confine it to `root`
///
/// Returns `None` if either path cannot be canonicalized (usually because it
/// does not exist) or if the canonical target escapes the canonical root.
pub fn resolve_within<R: PathResolver>(
    root: &Path,
    relative: impl AsRef<Path>,
    resolver: &R,
) -> Option<PathBuf> {
    let relative = relative.as_ref();
    let canonical_root = resolver.canonicalize(root).ok()?;
    let canonical = resolver.canonicalize(&root.join(relative)).ok()?;

    if canonical.starts_with(&canonical_root) {
        Some(canonical)
    } else {
        tracing::warn!(
            path = %relative.display(),
            "Refusing to read path that resolves outside the checkout"
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory resolver: maps joined paths to canonical targets
    #[derive(Default)]
    struct MapResolver {
        entries: HashMap<PathBuf, PathBuf>,
    }

    impl MapResolver {
        fn with(mut self, from: &str, to: &str) -> Self {
            self.entries.insert(PathBuf::from(from), PathBuf::from(to));
            self
        }
    }

    impl PathResolver for MapResolver {
        fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
            self.entries
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }
    }

    fn resolver() -> MapResolver {
        MapResolver::default().with("/tmp/scratch", "/private/tmp/scratch")
    }

    #[test]
    fn test_plain_file_inside_root() {
        let resolver = resolver().with(
            "/tmp/scratch/common/header.html",
            "/private/tmp/scratch/common/header.html",
        );

        let resolved = resolve_within(Path::new("/tmp/scratch"), "common/header.html", &resolver);
        assert_eq!(
            resolved,
            Some(PathBuf::from("/private/tmp/scratch/common/header.html"))
        );
    }

    #[test]
    fn test_symlink_escaping_root_is_refused() {
        let resolver = resolver().with("/tmp/scratch/common/header.html", "/etc/passwd");

        assert!(
            resolve_within(Path::new("/tmp/scratch"), "common/header.html", &resolver).is_none()
        );
    }

    #[test]
    fn test_dotdot_escaping_root_is_refused() {
        let resolver = resolver().with("/tmp/scratch/../../etc/passwd", "/etc/passwd");

        assert!(resolve_within(Path::new("/tmp/scratch"), "../../etc/passwd", &resolver).is_none());
    }

    #[test]
    fn test_sibling_with_shared_prefix_is_refused() {
        // "/private/tmp/scratch-other" shares a string prefix but not a path prefix
        let resolver = resolver().with(
            "/tmp/scratch/link",
            "/private/tmp/scratch-other/secret",
        );

        assert!(resolve_within(Path::new("/tmp/scratch"), "link", &resolver).is_none());
    }

    #[test]
    fn test_missing_file_is_none() {
        assert!(
            resolve_within(Path::new("/tmp/scratch"), "mobile/mobile.scss", &resolver()).is_none()
        );
    }

    #[test]
    fn test_missing_root_is_none() {
        let resolver = MapResolver::default().with("/tmp/gone/about.json", "/tmp/gone/about.json");

        assert!(resolve_within(Path::new("/tmp/gone"), "about.json", &resolver).is_none());
    }

    #[test]
    fn test_real_filesystem_symlink() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = temp.path().join("checkout");
        std::fs::create_dir_all(root.join("common")).unwrap();
        std::fs::write(root.join("common/footer.html"), "footer").unwrap();

        let outside = temp.path().join("outside.txt");
        std::fs::write(&outside, "secret").unwrap();

        #[cfg(unix)]
        std::os::unix::fs::symlink(&outside, root.join("common/header.html")).unwrap();

        assert!(resolve_within(&root, "common/footer.html", &FsResolver).is_some());
        assert!(resolve_within(&root, "common/header.html", &FsResolver).is_none());
        assert!(resolve_within(&root, "../outside.txt", &FsResolver).is_none());
    }
}
