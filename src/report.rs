use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use owo_colors::OwoColorize;

use crate::classify::group_by_folder;
use crate::config::{EffectiveConfig, QUARANTINE_DIR, REPORT_JSON, REPORT_MD};
use crate::model::{
    ApplyOutcome, ApplySummary, OutputFormat, PruneCandidate, PruneReport, ReportSummary, RunMode,
    human_bytes,
};

pub fn build(mode: RunMode, candidates: Vec<PruneCandidate>) -> PruneReport {
    let total_size_bytes: u64 = candidates.iter().map(|c| c.size).sum();
    let summary = ReportSummary {
        total_files: candidates.len(),
        total_size_bytes,
        total_size_human: human_bytes(total_size_bytes),
        by_folder: group_by_folder(&candidates),
    };
    PruneReport {
        mode,
        generated_at: Utc::now().to_rfc3339(),
        candidates,
        summary,
    }
}

/// Report-then-act: both artifacts land on disk before apply mode touches a
/// single file, so an interrupted run always leaves a record behind.
pub fn write(root: &Path, report: &PruneReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("serializing report")?;
    fs::write(root.join(REPORT_JSON), json)
        .with_context(|| format!("failed writing {REPORT_JSON}"))?;
    fs::write(root.join(REPORT_MD), render_markdown(report))
        .with_context(|| format!("failed writing {REPORT_MD}"))?;
    Ok(())
}

pub fn largest(candidates: &[PruneCandidate], n: usize) -> Vec<&PruneCandidate> {
    let mut sorted: Vec<&PruneCandidate> = candidates.iter().collect();
    sorted.sort_by(|a, b| b.size.cmp(&a.size).then(a.path.cmp(&b.path)));
    sorted.truncate(n);
    sorted
}

fn render_markdown(report: &PruneReport) -> String {
    let mode = match report.mode {
        RunMode::DryRun => "dry-run",
        RunMode::Apply => "apply",
    };
    let mut md = Vec::new();
    md.push("# Prune Report".to_string());
    md.push(String::new());
    md.push(format!("Mode: {mode}"));
    md.push(format!("Generated: {}", report.generated_at));
    md.push(String::new());
    md.push("## Summary".to_string());
    md.push(format!("- Candidates: {}", report.summary.total_files));
    md.push(format!("- Total size: {}", report.summary.total_size_human));
    md.push(String::new());
    md.push("### By folder".to_string());
    for row in &report.summary.by_folder {
        md.push(format!(
            "- {}: {} files, {}",
            row.folder, row.count, row.size_human
        ));
    }
    md.push(String::new());
    md.push("### Top 20 largest candidates".to_string());
    for c in largest(&report.candidates, 20) {
        md.push(format!(
            "- {} — {} — {} (conf {})",
            c.path,
            human_bytes(c.size),
            c.reason,
            c.confidence
        ));
    }
    md.push(String::new());
    md.push("---".to_string());
    md.push(String::new());
    md.push("Generated by repo-prune".to_string());
    md.push(String::new());
    md.join("\n")
}

pub fn print(report: &PruneReport, cfg: &EffectiveConfig) -> Result<()> {
    match cfg.format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Human => print_human(report, cfg.color.enabled()),
    }
}

fn print_json(report: &PruneReport) -> Result<()> {
    for c in &report.candidates {
        let obj = serde_json::json!({
            "path": c.path,
            "size": c.size,
            "reason": c.reason,
            "confidence": c.confidence,
        });
        println!("{}", serde_json::to_string(&obj)?);
    }
    Ok(())
}

fn print_human(report: &PruneReport, color: bool) -> Result<()> {
    for c in &report.candidates {
        let tag = format!("[{:.1}]", c.confidence);
        if color {
            let tag = if c.confidence >= 0.9 {
                tag.red().to_string()
            } else {
                tag.yellow().to_string()
            };
            println!(
                "{} {} {} {}",
                tag,
                c.path.blue(),
                human_bytes(c.size),
                c.reason
            );
        } else {
            println!("{} {} {} {}", tag, c.path, human_bytes(c.size), c.reason);
        }
    }

    if report.candidates.is_empty() {
        if color {
            println!("{}", "No prune candidates".green());
        } else {
            println!("No prune candidates");
        }
        return Ok(());
    }

    let line = format!(
        "candidates={} size={} reports={},{}",
        report.summary.total_files, report.summary.total_size_human, REPORT_JSON, REPORT_MD
    );
    if color {
        println!("{} {}", "Summary".bold().cyan(), line);
    } else {
        println!("Summary {line}");
    }
    Ok(())
}

pub fn print_apply_summary(summary: &ApplySummary, cfg: &EffectiveConfig) -> Result<()> {
    if matches!(cfg.format, OutputFormat::Json) {
        let obj = serde_json::json!({
            "deleted": summary.deleted,
            "quarantined": summary.quarantined,
            "failed": summary.failed,
            "dry_run": summary.outcome == ApplyOutcome::DryRun,
        });
        println!("{}", serde_json::to_string(&obj)?);
        return Ok(());
    }

    let line = format!(
        "deleted={} quarantined={} failed={} dry_run={}",
        summary.deleted,
        summary.quarantined,
        summary.failed.len(),
        summary.outcome == ApplyOutcome::DryRun
    );
    if cfg.color.enabled() {
        println!("{} {}", "Apply summary".bold().cyan(), line);
    } else {
        println!("Apply summary {line}");
    }
    for failure in &summary.failed {
        eprintln!("warning: {failure}");
    }
    if summary.quarantined > 0 && summary.outcome == ApplyOutcome::Committed {
        println!("Quarantined files remain under {QUARANTINE_DIR}/ pending review");
    }
    Ok(())
}
