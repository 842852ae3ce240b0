use std::path::Path;

use anyhow::Result;
use walkdir::WalkDir;

use crate::error::PruneError;
use crate::guard::Matcher;
use crate::model::RepoFile;

pub fn to_rel(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}

/// Walk the project root and return every regular file as a sorted,
/// deduplicated list of repo-relative paths with sizes. Any walk or metadata
/// error is fatal: a partial enumeration cannot be trusted downstream.
pub fn enumerate(root: &Path, ignore: &[String]) -> Result<Vec<RepoFile>> {
    let ignore_set = Matcher::new(ignore)?;
    // Patterns of the form `dir/**` also prune descent into `dir`.
    let prune_dirs: Vec<String> = ignore
        .iter()
        .filter_map(|p| p.strip_suffix("/**").map(str::to_string))
        .collect();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if !entry.file_type().is_dir() {
                return true;
            }
            let rel = to_rel(root, entry.path());
            rel.is_empty() || !prune_dirs.iter().any(|d| *d == rel)
        });

    let mut out = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| PruneError::Walk {
            path: root.to_path_buf(),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = to_rel(root, entry.path());
        if ignore_set.is_match(&rel) {
            continue;
        }
        let meta = entry.metadata().map_err(|e| PruneError::Walk {
            path: entry.path().to_path_buf(),
            message: e.to_string(),
        })?;
        out.push(RepoFile {
            path: rel,
            size: meta.len(),
        });
    }

    out.sort();
    out.dedup();
    Ok(out)
}
