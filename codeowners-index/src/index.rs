use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use tracing::debug;

use crate::{
    error::{Error, Result},
    locator, parser,
    ruleset::{Owner, RuleSet},
};

/// Answers ownership queries for paths in a repository. Built once from the
/// manifest and read-only afterwards, so it can be shared across threads.
#[derive(Debug, Clone)]
pub struct OwnershipIndex {
    directory: PathBuf,
    rules: RuleSet,
}

impl OwnershipIndex {
    /// Locate and parse the manifest named `filename` under `repo_root`.
    pub fn build(repo_root: impl AsRef<Path>, filename: &str) -> Result<Self> {
        let manifest = locator::locate(repo_root, filename)?;
        debug!(path = %manifest.path.display(), "using manifest");

        let parsed = parser::parse_file(&manifest.path).map_err(|source| Error::Io {
            path: manifest.path.clone(),
            source,
        })?;
        Ok(Self::new(manifest.directory, parsed.into_ruleset()))
    }

    pub fn new(directory: impl Into<PathBuf>, rules: RuleSet) -> Self {
        Self {
            directory: directory.into(),
            rules,
        }
    }

    /// Build an index from manifest text, without touching the filesystem.
    pub fn from_source(directory: impl Into<PathBuf>, source: &str) -> Self {
        Self::new(directory, RuleSet::parse(source))
    }

    /// The directory patterns are resolved against.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Convert `path` into the slash-separated form patterns are matched
    /// against. Relative paths are taken as relative to [`Self::directory`].
    /// Returns `None` for paths outside the directory.
    pub fn relative_path(&self, path: impl AsRef<Path>) -> Option<String> {
        let path = path.as_ref();
        let relative = if path.is_absolute() {
            path.strip_prefix(&self.directory).ok()?
        } else {
            path
        };

        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(segment) => segments.push(segment.to_string_lossy()),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(segments.join("/"))
    }

    /// Owners of `path`. Whether the path is a directory is determined from
    /// the filesystem; paths that can't be read are treated as files.
    pub fn owners(&self, path: impl AsRef<Path>) -> &[Owner] {
        let Some(relative) = self.relative_path(&path) else {
            debug!(path = %path.as_ref().display(), "path is outside the repository");
            return &[];
        };

        let is_directory = match fs::metadata(self.directory.join(&relative)) {
            Ok(metadata) => metadata.is_dir(),
            Err(err) => {
                debug!(path = %relative, "unable to stat path: {}", err);
                false
            }
        };
        self.owners_for(&relative, is_directory)
    }

    /// Owners of an already-relativized path.
    pub fn owners_for(&self, relative_path: &str, is_directory: bool) -> &[Owner] {
        self.rules.owners(relative_path, is_directory)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_relative_path() {
        let index = OwnershipIndex::from_source("/repo", "");

        let examples = [
            ("/repo/src/main.rs", Some("src/main.rs")),
            ("src/main.rs", Some("src/main.rs")),
            ("./src//main.rs", Some("src/main.rs")),
            ("/elsewhere/main.rs", None),
            ("../main.rs", None),
        ];
        for (path, expected) in examples {
            assert_eq!(
                index.relative_path(path).as_deref(),
                expected,
                "relative path of {}",
                path
            );
        }
    }

    #[test]
    fn test_build_uses_repo_root() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join(".github")).unwrap();
        fs::create_dir_all(root.path().join("src")).unwrap();
        fs::write(
            root.path().join(".github/CODEOWNERS"),
            "/src/ @core\n/.github/ @admins\n",
        )
        .unwrap();

        let index = OwnershipIndex::build(root.path(), "CODEOWNERS").unwrap();
        assert_eq!(index.directory(), root.path());
        assert_eq!(index.rules().len(), 2);
        assert_eq!(index.owners("src/lib.rs"), ["@core"]);
        assert_eq!(index.owners(root.path().join("src/lib.rs")), ["@core"]);
        assert_eq!(index.owners(".github/CODEOWNERS"), ["@admins"]);
    }

    #[test]
    fn test_build_from_relative_root() {
        let root = tempfile::Builder::new().tempdir_in(".").unwrap();
        assert!(root.path().is_relative());
        fs::write(root.path().join("CODEOWNERS"), "*.go @infra-team\n").unwrap();
        fs::write(root.path().join("main.go"), "package main\n").unwrap();

        let index = OwnershipIndex::build(root.path(), "CODEOWNERS").unwrap();
        assert!(index.directory().is_absolute());

        let absolute = std::env::current_dir().unwrap().join(root.path()).join("main.go");
        assert_eq!(index.owners(&absolute), ["@infra-team"]);
        assert_eq!(index.owners("main.go"), ["@infra-team"]);
    }

    #[test]
    fn test_build_without_manifest() {
        let root = TempDir::new().unwrap();
        let err = OwnershipIndex::build(root.path(), "CODEOWNERS").unwrap_err();
        assert!(matches!(err, Error::ManifestNotFound { .. }));
    }

    #[test]
    fn test_directory_detection() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("build")).unwrap();
        fs::write(root.path().join("dist"), "not a directory").unwrap();

        let index = OwnershipIndex::from_source(
            root.path(),
            "* @everyone\nbuild/ @release\ndist/ @release\n",
        );
        assert_eq!(index.owners("build"), ["@release"]);
        assert_eq!(index.owners("dist"), ["@everyone"]);
        // Missing paths are treated as files
        assert_eq!(index.owners("missing/"), ["@everyone"]);
        assert_eq!(index.owners("build/missing.o"), ["@release"]);
    }

    #[test]
    fn test_verify_scenario() {
        let index = OwnershipIndex::from_source("/repo", "*.go @infra-team\n");
        assert_eq!(index.owners_for("main.go", false), ["@infra-team"]);
        assert!(index.owners_for("main.rs", false).is_empty());
    }
}
