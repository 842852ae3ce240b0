use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Result;

use crate::config::{QUARANTINE_DIR, ValidateCommands};
use crate::error::PruneError;
use crate::manifest;
use crate::model::{ApplyOutcome, ApplySummary, PruneCandidate};

/// Confidence at or above this tier is deleted outright; the [0.8, 0.9) band
/// is quarantined so only that band is reversible.
const DELETE_THRESHOLD: f64 = 0.9;
const QUARANTINE_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    pub force: bool,
    pub yes: bool,
}

pub struct ApplyEngine<'a> {
    root: &'a Path,
    commands: &'a ValidateCommands,
}

impl<'a> ApplyEngine<'a> {
    pub fn new(root: &'a Path, commands: &'a ValidateCommands) -> Self {
        Self { root, commands }
    }

    /// report (already written) -> delete -> quarantine -> validate ->
    /// committed or rolled back. Per-file delete/move failures are collected,
    /// not fatal; a validation failure restores the quarantine and errors out
    /// while deletions stay committed.
    pub fn run(&self, candidates: &[PruneCandidate], opts: ApplyOptions) -> Result<ApplySummary> {
        if !opts.yes {
            eprintln!("Refusing to mutate without --yes");
            return Ok(ApplySummary {
                deleted: 0,
                quarantined: 0,
                failed: Vec::new(),
                outcome: ApplyOutcome::DryRun,
            });
        }

        let (to_delete, to_quarantine): (Vec<_>, Vec<_>) = candidates.iter().partition(|c| {
            opts.force || c.confidence >= DELETE_THRESHOLD
        });
        let to_quarantine: Vec<_> = to_quarantine
            .into_iter()
            .filter(|c| c.confidence >= QUARANTINE_THRESHOLD)
            .collect();

        let mut failed = Vec::new();

        let mut deleted = 0usize;
        for c in &to_delete {
            match fs::remove_file(self.root.join(&c.path)) {
                Ok(()) => deleted += 1,
                Err(e) => failed.push(format!("delete {}: {e}", c.path)),
            }
        }

        let mut moved: Vec<String> = Vec::new();
        for c in &to_quarantine {
            match self.quarantine(&c.path) {
                Ok(()) => moved.push(c.path.clone()),
                Err(e) => failed.push(format!("quarantine {}: {e}", c.path)),
            }
        }

        if let Some(stage) = self.validate() {
            for rel in &moved {
                if let Err(e) = self.restore(rel) {
                    eprintln!("warning: failed restoring {rel}: {e}");
                }
            }
            return Err(PruneError::Validation { stage }.into());
        }

        Ok(ApplySummary {
            deleted,
            quarantined: moved.len(),
            failed,
            outcome: ApplyOutcome::Committed,
        })
    }

    fn quarantine_path(&self, rel: &str) -> PathBuf {
        self.root.join(QUARANTINE_DIR).join(rel)
    }

    fn quarantine(&self, rel: &str) -> std::io::Result<()> {
        let dest = self.quarantine_path(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(self.root.join(rel), dest)
    }

    fn restore(&self, rel: &str) -> std::io::Result<()> {
        let back = self.root.join(rel);
        if let Some(parent) = back.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(self.quarantine_path(rel), back)
    }

    /// Build, lint, then typecheck as opaque processes whose only contract is
    /// the exit code. Returns the name of the first failing stage.
    fn validate(&self) -> Option<String> {
        let build = command_chain(&self.commands.build, &[&["pnpm", "build"], &["npm", "run", "build"]]);
        if run_chain(self.root, &build) != ChainResult::Passed {
            return Some("build".to_string());
        }

        let lint = command_chain(&self.commands.lint, &[&["pnpm", "lint"], &["npm", "run", "lint"]]);
        if run_chain(self.root, &lint) != ChainResult::Passed {
            return Some("lint".to_string());
        }

        // Typecheck runs only when declared; an unavailable pipeline is not a
        // failure, a failing one is.
        let declared = self.commands.typecheck.is_some() || manifest::has_script(self.root, "typecheck");
        if declared {
            let typecheck = command_chain(
                &self.commands.typecheck,
                &[&["pnpm", "typecheck"], &["npm", "run", "typecheck"]],
            );
            if run_chain(self.root, &typecheck) == ChainResult::Failed {
                return Some("typecheck".to_string());
            }
        }

        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainResult {
    Passed,
    Failed,
    Unavailable,
}

fn command_chain(configured: &Option<Vec<String>>, defaults: &[&[&str]]) -> Vec<Vec<String>> {
    match configured {
        Some(argv) if !argv.is_empty() => vec![argv.clone()],
        _ => defaults
            .iter()
            .map(|argv| argv.iter().map(|s| s.to_string()).collect())
            .collect(),
    }
}

/// Try each command until one passes. All spawn failures means the pipeline
/// is unavailable; any non-zero exit with no pass means it failed.
fn run_chain(root: &Path, chain: &[Vec<String>]) -> ChainResult {
    let mut saw_failure = false;
    for argv in chain {
        match Command::new(&argv[0]).args(&argv[1..]).current_dir(root).status() {
            Ok(status) if status.success() => return ChainResult::Passed,
            Ok(_) => saw_failure = true,
            Err(_) => {}
        }
    }
    if saw_failure {
        ChainResult::Failed
    } else {
        ChainResult::Unavailable
    }
}
