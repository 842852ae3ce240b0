use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    DryRun,
    Apply,
}

/// A regular file under the project root, path normalized to forward slashes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RepoFile {
    pub path: String,
    pub size: u64,
}

impl RepoFile {
    pub fn extension(&self) -> &str {
        let name = self.path.rsplit('/').next().unwrap_or(&self.path);
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext,
            _ => "",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Occurrence {
    pub file: String,
    pub line: usize,
    pub comment: bool,
}

/// All recorded textual references to one target path. `comment_only` stays
/// true until a non-comment occurrence is recorded.
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceHit {
    pub occurrences: Vec<Occurrence>,
    pub comment_only: bool,
}

impl ReferenceHit {
    pub fn new() -> Self {
        Self {
            occurrences: Vec::new(),
            comment_only: true,
        }
    }

    pub fn record(&mut self, file: &str, line: usize, comment: bool) {
        if !comment {
            self.comment_only = false;
        }
        self.occurrences.push(Occurrence {
            file: file.to_string(),
            line,
            comment,
        });
    }
}

impl Default for ReferenceHit {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PruneCandidate {
    pub path: String,
    pub size: u64,
    pub reason: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FolderStat {
    pub folder: String,
    pub count: usize,
    pub size_bytes: u64,
    pub size_human: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub total_files: usize,
    pub total_size_bytes: u64,
    pub total_size_human: String,
    pub by_folder: Vec<FolderStat>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PruneReport {
    pub mode: RunMode,
    pub generated_at: String,
    pub candidates: Vec<PruneCandidate>,
    pub summary: ReportSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    DryRun,
    Committed,
}

#[derive(Debug, Clone)]
pub struct ApplySummary {
    pub deleted: usize,
    pub quarantined: usize,
    pub failed: Vec<String>,
    pub outcome: ApplyOutcome,
}

pub fn human_bytes(bytes: u64) -> String {
    const THRESH: f64 = 1024.0;
    if (bytes as f64) < THRESH {
        return format!("{bytes} B");
    }
    let units = ["KB", "MB", "GB", "TB"];
    let mut value = bytes as f64 / THRESH;
    let mut unit = 0;
    while value >= THRESH && unit < units.len() - 1 {
        value /= THRESH;
        unit += 1;
    }
    format!("{:.1} {}", value, units[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_bytes_units() {
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(2048), "2.0 KB");
        assert_eq!(human_bytes(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn extension_of_dotfile_is_empty() {
        let f = RepoFile { path: ".env".into(), size: 0 };
        assert_eq!(f.extension(), "");
        let g = RepoFile { path: "app/page.tsx".into(), size: 0 };
        assert_eq!(g.extension(), "tsx");
    }

    #[test]
    fn reference_hit_comment_only_clears() {
        let mut hit = ReferenceHit::new();
        hit.record("a.md", 3, true);
        assert!(hit.comment_only);
        hit.record("b.tsx", 9, false);
        assert!(!hit.comment_only);
        assert_eq!(hit.occurrences.len(), 2);
    }
}
