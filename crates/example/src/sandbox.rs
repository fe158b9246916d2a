//! Working directory confinement.

use std::path::{Component, Path, PathBuf};

/// A directory that every file operation is confined to.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// Creates a sandbox rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The sandbox root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `path` relative to the root.
    ///
    /// Returns `None` for absolute paths and paths that climb out through `..`.
    #[must_use]
    pub fn resolve(&self, path: impl AsRef<Path>) -> Option<PathBuf> {
        let path = path.as_ref();
        let mut resolved = self.root.clone();
        for component in path.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        (resolved != self.root).then_some(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_paths_under_root() {
        let sandbox = Sandbox::new("/srv/work");
        assert_eq!(
            sandbox.resolve("notes/a.txt"),
            Some(PathBuf::from("/srv/work/notes/a.txt"))
        );
        assert_eq!(
            sandbox.resolve("./b.txt"),
            Some(PathBuf::from("/srv/work/b.txt"))
        );
    }

    #[test]
    fn rejects_escapes() {
        let sandbox = Sandbox::new("/srv/work");
        assert_eq!(sandbox.resolve("../etc/passwd"), None);
        assert_eq!(sandbox.resolve("notes/../../x"), None);
        assert_eq!(sandbox.resolve("/etc/passwd"), None);
    }

    #[test]
    fn rejects_the_root_itself() {
        let sandbox = Sandbox::new("/srv/work");
        assert_eq!(sandbox.resolve("."), None);
        assert_eq!(sandbox.resolve(""), None);
    }
}
