use std::collections::{BTreeMap, BTreeSet};

use crate::model::{FolderStat, PruneCandidate, ReferenceHit, RepoFile, human_bytes};

pub const REASON_NO_REFS: &str = "No references across graph and scans";
pub const REASON_COMMENT_ONLY: &str = "Only referenced in comments";

/// Every enumerated file not in the used set, in path order. Pure: the same
/// snapshot always yields the same list.
pub fn classify(
    files: &[RepoFile],
    used: &BTreeSet<String>,
    hits: &BTreeMap<String, ReferenceHit>,
) -> Vec<PruneCandidate> {
    let mut out = Vec::new();
    for file in files {
        if used.contains(&file.path) {
            continue;
        }
        let (reason, confidence) = match hits.get(&file.path) {
            Some(hit) if hit.comment_only => (REASON_COMMENT_ONLY.to_string(), 0.8),
            _ => (REASON_NO_REFS.to_string(), 1.0),
        };
        out.push(PruneCandidate {
            path: file.path.clone(),
            size: file.size,
            reason,
            confidence,
        });
    }
    out
}

/// Aggregate candidates by top-level directory, largest first.
pub fn group_by_folder(candidates: &[PruneCandidate]) -> Vec<FolderStat> {
    let mut agg: BTreeMap<String, (usize, u64)> = BTreeMap::new();
    for c in candidates {
        let folder = match c.path.split_once('/') {
            Some((top, _)) => format!("{top}/"),
            None => "./".to_string(),
        };
        let entry = agg.entry(folder).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += c.size;
    }

    let mut stats: Vec<FolderStat> = agg
        .into_iter()
        .map(|(folder, (count, size))| FolderStat {
            folder,
            count,
            size_bytes: size,
            size_human: human_bytes(size),
        })
        .collect();
    stats.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes).then(a.folder.cmp(&b.folder)));
    stats
}
