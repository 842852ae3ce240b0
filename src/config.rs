use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{Cli, color::ColorPolicy, model::OutputFormat};

/// Well-known locations, all relative to the project root.
pub const QUARANTINE_DIR: &str = "__trash__";
pub const REPORT_JSON: &str = "prune-report.json";
pub const REPORT_MD: &str = "prune-report.md";
pub const KEEP_FILE: &str = "scripts/prune-keep.yml";
pub const CONFIG_FILE: &str = "repo-prune.toml";

#[derive(Debug, Clone, Deserialize, Default)]
struct FileConfig {
    ignore: Option<Vec<String>>,
    extensions: Option<Vec<String>>,
    externals: Option<Vec<String>>,
    format: Option<String>,
    color: Option<String>,
    validate: Option<ValidateFileConfig>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct ValidateFileConfig {
    build: Option<Vec<String>>,
    lint: Option<Vec<String>>,
    typecheck: Option<Vec<String>>,
}

/// Overrides for the apply-mode validation pipeline. When a command is not
/// configured the engine falls back to the pnpm/npm chains.
#[derive(Debug, Clone, Default)]
pub struct ValidateCommands {
    pub build: Option<Vec<String>>,
    pub lint: Option<Vec<String>>,
    pub typecheck: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub ignore: Vec<String>,
    pub extensions: Vec<String>,
    pub externals: Vec<String>,
    pub include_tests: bool,
    pub format: OutputFormat,
    pub color: ColorPolicy,
    pub validate: ValidateCommands,
}

impl EffectiveConfig {
    pub fn load(cli: &Cli) -> Result<Self> {
        let path = cli.config.clone().or_else(|| {
            let p = PathBuf::from(CONFIG_FILE);
            if p.exists() { Some(p) } else { None }
        });

        let fcfg = if let Some(path) = path {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed reading config {}", path.display()))?;
            toml::from_str::<FileConfig>(&raw)
                .with_context(|| format!("failed parsing config {}", path.display()))?
        } else {
            FileConfig::default()
        };

        let format = cli
            .format
            .or_else(|| parse_format(fcfg.format.as_deref()))
            .unwrap_or(OutputFormat::Human);

        let color = cli
            .color
            .or_else(|| parse_color(fcfg.color.as_deref()))
            .unwrap_or(ColorPolicy::Auto);

        let validate = fcfg
            .validate
            .map(|v| ValidateCommands {
                build: v.build,
                lint: v.lint,
                typecheck: v.typecheck,
            })
            .unwrap_or_default();

        Ok(Self {
            ignore: fcfg.ignore.unwrap_or_else(default_ignore),
            extensions: fcfg.extensions.unwrap_or_else(default_extensions),
            externals: fcfg.externals.unwrap_or_else(default_externals),
            include_tests: cli.include_tests,
            format,
            color,
            validate,
        })
    }
}

fn parse_format(v: Option<&str>) -> Option<OutputFormat> {
    match v {
        Some("json") => Some(OutputFormat::Json),
        Some("human") => Some(OutputFormat::Human),
        _ => None,
    }
}

fn parse_color(v: Option<&str>) -> Option<ColorPolicy> {
    match v {
        Some("always") => Some(ColorPolicy::Always),
        Some("never") => Some(ColorPolicy::Never),
        Some("auto") => Some(ColorPolicy::Auto),
        _ => None,
    }
}

/// Directories never enumerated: dependency cache, build output, VCS
/// metadata, and the quarantine itself.
fn default_ignore() -> Vec<String> {
    vec![
        "node_modules/**".to_string(),
        ".next/**".to_string(),
        ".git/**".to_string(),
        format!("{QUARANTINE_DIR}/**"),
    ]
}

/// Extensions probed while resolving an extensionless import specifier.
fn default_extensions() -> Vec<String> {
    ["ts", "tsx", "js", "jsx", "mjs", "cjs", "json", "css"]
        .map(String::from)
        .to_vec()
}

/// Packages the module graph treats as opaque boundaries.
fn default_externals() -> Vec<String> {
    [
        "next",
        "react",
        "react-dom",
        "three",
        "@react-three/*",
        "framer-motion",
        "next-themes",
        "zustand",
    ]
    .map(String::from)
    .to_vec()
}

/// Parse the keep-rule file: one `keep:` key followed by `- pattern` items.
/// That single flat list is the whole grammar; richer YAML is out of scope.
/// A missing or malformed file degrades to no rules.
pub fn load_keep_rules(root: &Path) -> Vec<String> {
    match fs::read_to_string(root.join(KEEP_FILE)) {
        Ok(text) => parse_keep_rules(&text),
        Err(_) => Vec::new(),
    }
}

pub fn parse_keep_rules(text: &str) -> Vec<String> {
    let mut rules = Vec::new();
    let mut in_keep = false;
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with("keep:") {
            in_keep = true;
            continue;
        }
        if in_keep {
            if let Some(rest) = line.strip_prefix('-') {
                rules.push(rest.trim().to_string());
            } else if !raw.starts_with(' ') && !raw.starts_with('\t') {
                in_keep = false;
            }
        }
    }
    rules.retain(|r| !r.is_empty());
    rules
}
