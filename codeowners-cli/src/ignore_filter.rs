use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, warn};

/// Decides whether a repository path is excluded by `.gitignore`. The nearest
/// `.gitignore` at or above the root is used; without one nothing is ignored.
pub struct IgnoreFilter {
    root: PathBuf,
    gitignore: Option<Gitignore>,
}

impl IgnoreFilter {
    pub fn load(root: &Path) -> Self {
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        let gitignore = find_up(&root, ".gitignore").and_then(|path| {
            let base = path.parent().unwrap_or(root.as_path());
            let mut builder = GitignoreBuilder::new(base);
            if let Some(err) = builder.add(&path) {
                warn!("failed to load {}: {}", path.display(), err);
            }
            match builder.build() {
                Ok(gitignore) => {
                    debug!("loaded {}", path.display());
                    Some(gitignore)
                }
                Err(err) => {
                    warn!("failed to build ignore rules from {}: {}", path.display(), err);
                    None
                }
            }
        });

        Self { root, gitignore }
    }

    /// Check a file path relative to the root.
    pub fn is_ignored(&self, relative_path: &str) -> bool {
        match &self.gitignore {
            Some(gi) => gi
                .matched_path_or_any_parents(self.root.join(relative_path), false)
                .is_ignore(),
            None => false,
        }
    }
}

fn find_up(start: &Path, filename: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(filename))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_gitignore_rules() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join(".gitignore"), "node_modules/\n*.log\n").unwrap();

        let filter = IgnoreFilter::load(root.path());
        assert!(filter.is_ignored("debug.log"));
        assert!(filter.is_ignored("logs/today.log"));
        assert!(filter.is_ignored("node_modules/left-pad/index.js"));
        assert!(!filter.is_ignored("src/main.rs"));
    }

    #[test]
    fn test_gitignore_in_parent_directory() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("project")).unwrap();
        fs::write(root.path().join(".gitignore"), "/project/target/\n").unwrap();

        let filter = IgnoreFilter::load(&root.path().join("project"));
        assert!(filter.is_ignored("target/debug/app"));
        assert!(!filter.is_ignored("src/target.rs"));
    }

    #[test]
    fn test_without_gitignore() {
        let root = TempDir::new().unwrap();
        let filter = IgnoreFilter::load(root.path());
        assert!(!filter.is_ignored("notes.txt"));
    }
}
