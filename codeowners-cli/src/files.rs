use std::{path::Path, process::Command};

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

/// Files tracked by git under `root`, relative to `root`.
pub fn tracked_files(root: &Path) -> Result<Vec<String>> {
    let output = Command::new("git")
        .args(["ls-files", "-z"])
        .current_dir(root)
        .output()
        .context("failed to run git ls-files")?;

    if !output.status.success() {
        bail!(
            "git ls-files failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let files = split_nul(&output.stdout);
    debug!(count = files.len(), "listed tracked files");
    Ok(files)
}

/// Every non-directory entry under `root`, skipping `.git`, in file name
/// order. Entries that can't be read are logged and left out.
pub fn walk_files(root: &Path) -> Vec<String> {
    walkdir::WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git")
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("skipping unreadable path: {}", err);
                None
            }
        })
        .filter(|entry| !entry.file_type().is_dir())
        .filter_map(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .ok()
                .map(|p| p.to_string_lossy().into_owned())
        })
        .collect()
}

fn split_nul(stdout: &[u8]) -> Vec<String> {
    stdout
        .split(|&b| b == 0)
        .filter(|path| !path.is_empty())
        .map(|path| String::from_utf8_lossy(path).into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_split_nul() {
        assert_eq!(
            split_nul(b"README.md\0src/main.rs\0dir with space/a b.txt\0"),
            vec!["README.md", "src/main.rs", "dir with space/a b.txt"]
        );
        assert!(split_nul(b"").is_empty());
    }

    #[test]
    fn test_walk_files() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join(".git/objects")).unwrap();
        fs::create_dir_all(root.path().join("src/empty")).unwrap();
        fs::write(root.path().join(".git/HEAD"), "ref").unwrap();
        fs::write(root.path().join("src/main.rs"), "").unwrap();
        fs::write(root.path().join("README.md"), "").unwrap();

        let files = walk_files(root.path());
        assert_eq!(files, vec!["README.md", "src/main.rs"]);
    }

    #[test]
    fn test_walk_unreadable_root() {
        let root = TempDir::new().unwrap();
        assert!(walk_files(&root.path().join("missing")).is_empty());
    }
}
