use std::fs;

use codeowners_index::OwnershipIndex;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

/// A file that took part in the audit, with the owners it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: String,
    pub owners: Vec<String>,
}

impl Entry {
    pub fn is_owned(&self) -> bool {
        !self.owners.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Report {
    pub entries: Vec<Entry>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_files: usize,
    pub total_files_owned: usize,
    pub ownership_coverage: String,
}

impl Report {
    pub fn unowned(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|entry| !entry.is_owned())
    }

    pub fn summary(&self) -> Summary {
        let total_files = self.entries.len();
        let total_files_owned = self.entries.iter().filter(|e| e.is_owned()).count();
        let coverage = if total_files == 0 {
            0.0
        } else {
            total_files_owned as f64 / total_files as f64 * 100.0
        };

        Summary {
            total_files,
            total_files_owned,
            ownership_coverage: format!("{:.2}", coverage),
        }
    }
}

/// Resolve owners for every file in `files`. Ignored paths, directories and
/// paths that can't be read are left out of the report.
pub fn run<F>(index: &OwnershipIndex, files: &[String], is_ignored: F) -> Report
where
    F: Fn(&str) -> bool + Sync,
{
    #[cfg(feature = "rayon")]
    let files = files.par_iter();
    #[cfg(not(feature = "rayon"))]
    let files = files.iter();

    let entries = files
        .filter_map(|file| audit_file(index, file, &is_ignored))
        .collect();
    Report { entries }
}

fn audit_file(
    index: &OwnershipIndex,
    file: &str,
    is_ignored: impl Fn(&str) -> bool,
) -> Option<Entry> {
    let Some(path) = index.relative_path(file) else {
        warn!(path = %file, "skipping path outside the repository");
        return None;
    };

    if is_ignored(&path) {
        debug!(path = %path, "skipping ignored path");
        return None;
    }

    match fs::metadata(index.directory().join(&path)) {
        Ok(metadata) if metadata.is_dir() => return None,
        Ok(_) => {}
        Err(err) => {
            warn!(path = %path, "skipping unreadable path: {}", err);
            return None;
        }
    }

    let owners = index
        .owners_for(&path, false)
        .iter()
        .map(|owner| owner.to_string())
        .collect();
    Some(Entry { path, owners })
}
