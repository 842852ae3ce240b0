pub mod analyzer;
pub mod apply;
pub mod classify;
pub mod color;
pub mod config;
pub mod error;
pub mod graph;
pub mod guard;
pub mod manifest;
pub mod model;
pub mod report;
pub mod textscan;
pub mod walker;

use std::path::PathBuf;

use analyzer::Analyzer;
use anyhow::{Context, Result};
use apply::{ApplyEngine, ApplyOptions};
use clap::{CommandFactory, Parser};
use color::ColorPolicy;
use config::EffectiveConfig;
use model::{OutputFormat, RunMode};

#[derive(Debug, clap::Parser)]
#[command(
    name = "repo-prune",
    version,
    about = "Find dead files in a Next.js repo and safely prune them",
    disable_help_subcommand = true
)]
pub struct Cli {
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    #[arg(long, value_enum, global = true)]
    pub color: Option<ColorPolicy>,

    /// Do not automatically protect test and story files.
    #[arg(long, global = true, default_value_t = false)]
    pub include_tests: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Analyze the tree and write the prune report (never mutates).
    Scan {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Prune: delete high-confidence candidates, quarantine the rest, then
    /// validate with the project's build/lint pipeline.
    Apply {
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Treat every candidate as deletable, skipping the quarantine.
        #[arg(long, default_value_t = false)]
        force: bool,
        /// Confirm mutation in non-interactive mode.
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Show command help.
    Help {
        command: Option<String>,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Command::Help { command }) = &cli.command {
        if let Some(name) = command {
            let mut cmd = Cli::command();
            if let Some(sc) = cmd.find_subcommand_mut(name) {
                sc.print_help().context("failed to print help")?;
                println!();
                return Ok(());
            }
        }
        Cli::command().print_help().context("failed to print help")?;
        println!();
        return Ok(());
    }

    let cfg = EffectiveConfig::load(&cli)?;
    let command = cli.command.unwrap_or(Command::Scan {
        path: PathBuf::from("."),
    });

    match command {
        Command::Scan { path } => run_scan(path, &cfg),
        Command::Apply { path, force, yes } => run_apply(path, &cfg, ApplyOptions { force, yes }),
        Command::Help { .. } => unreachable!(),
    }
}

fn run_scan(root: PathBuf, cfg: &EffectiveConfig) -> Result<()> {
    let analyzer = Analyzer::new(cfg.clone());
    let analysis = analyzer.analyze(&root)?;
    let candidates = classify::classify(&analysis.files, &analysis.used, &analysis.hits);
    let report = report::build(RunMode::DryRun, candidates);
    report::write(&root, &report)?;
    report::print(&report, cfg)
}

fn run_apply(root: PathBuf, cfg: &EffectiveConfig, opts: ApplyOptions) -> Result<()> {
    let analyzer = Analyzer::new(cfg.clone());
    let analysis = analyzer.analyze(&root)?;
    let candidates = classify::classify(&analysis.files, &analysis.used, &analysis.hits);
    let report = report::build(RunMode::Apply, candidates);
    // The report always lands before the first deletion.
    report::write(&root, &report)?;
    report::print(&report, cfg)?;

    let engine = ApplyEngine::new(&root, &cfg.validate);
    let summary = engine.run(&report.candidates, opts)?;
    report::print_apply_summary(&summary, cfg)
}
