use std::path::{self, Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Directories searched for the manifest, relative to the repository root and
/// in order of precedence.
const SEARCH_DIRS: &[&str] = &["", ".github", "docs"];

/// A manifest found by [`locate`]. `directory` is the absolute base that
/// patterns are resolved against: always the repository root, even when the
/// manifest lives in `.github/` or `docs/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub path: PathBuf,
    pub directory: PathBuf,
}

/// Find `filename` in the conventional locations under `repo_root`. The first
/// existing file wins. A relative `repo_root` is resolved against the current
/// directory, so `Manifest::directory` is always absolute.
pub fn locate(repo_root: impl AsRef<Path>, filename: &str) -> Result<Manifest> {
    let repo_root = repo_root.as_ref();
    let repo_root = path::absolute(repo_root).map_err(|source| Error::Io {
        path: repo_root.to_path_buf(),
        source,
    })?;
    let candidates = SEARCH_DIRS
        .iter()
        .map(|dir| repo_root.join(dir).join(filename))
        .collect::<Vec<_>>();

    for candidate in &candidates {
        debug!(path = %candidate.display(), "looking for manifest");
        if candidate.is_file() {
            return Ok(Manifest {
                path: candidate.clone(),
                directory: repo_root,
            });
        }
    }

    Err(Error::ManifestNotFound {
        filename: filename.to_owned(),
        attempted: candidates,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_search_order() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join(".github")).unwrap();
        fs::create_dir_all(root.path().join("docs")).unwrap();

        fs::write(root.path().join("docs/CODEOWNERS"), "* @docs\n").unwrap();
        let manifest = locate(root.path(), "CODEOWNERS").unwrap();
        assert_eq!(manifest.path, root.path().join("docs/CODEOWNERS"));

        fs::write(root.path().join(".github/CODEOWNERS"), "* @github\n").unwrap();
        let manifest = locate(root.path(), "CODEOWNERS").unwrap();
        assert_eq!(manifest.path, root.path().join(".github/CODEOWNERS"));

        fs::write(root.path().join("CODEOWNERS"), "* @root\n").unwrap();
        let manifest = locate(root.path(), "CODEOWNERS").unwrap();
        assert_eq!(manifest.path, root.path().join("CODEOWNERS"));
    }

    #[test]
    fn test_directory_is_repo_root() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join(".github")).unwrap();
        fs::write(root.path().join(".github/OWNERS"), "* @github\n").unwrap();

        let manifest = locate(root.path(), "OWNERS").unwrap();
        assert_eq!(manifest.path, root.path().join(".github/OWNERS"));
        assert_eq!(manifest.directory, root.path());
    }

    #[test]
    fn test_not_found() {
        let root = TempDir::new().unwrap();
        // A directory with the manifest's name doesn't count
        fs::create_dir_all(root.path().join("CODEOWNERS")).unwrap();

        match locate(root.path(), "CODEOWNERS") {
            Err(Error::ManifestNotFound {
                filename,
                attempted,
            }) => {
                assert_eq!(filename, "CODEOWNERS");
                assert_eq!(
                    attempted,
                    vec![
                        root.path().join("CODEOWNERS"),
                        root.path().join(".github/CODEOWNERS"),
                        root.path().join("docs/CODEOWNERS"),
                    ]
                );
            }
            other => panic!("expected ManifestNotFound, got {:?}", other),
        }
    }
}
