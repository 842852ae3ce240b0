use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use oxc_allocator::Allocator;
use oxc_parser::Parser;
use oxc_span::{SourceType, Span};
use regex::Regex;

use crate::error::PruneError;
use crate::guard::Matcher;
use crate::model::RepoFile;
use crate::textscan::public_rooted;

/// Framework-convention routing files plus the middleware shim; these are the
/// roots of the bundling traversal.
const ENTRY_GLOBS: &[&str] = &[
    "app/**/page.{ts,tsx,js,jsx}",
    "app/**/layout.{ts,tsx,js,jsx}",
    "app/**/template.{ts,tsx,js,jsx}",
    "app/**/loading.{ts,tsx,js,jsx}",
    "app/**/error.{ts,tsx,js,jsx}",
    "app/**/not-found.{ts,tsx,js,jsx}",
    "app/**/route.{ts,tsx,js,jsx}",
    "app/**/*.mdx",
    "middleware.{ts,js}",
];

pub fn collect_entry_points(files: &[RepoFile]) -> Result<Vec<String>> {
    let matcher = Matcher::new(ENTRY_GLOBS)?;
    let mut entries: Vec<String> = files
        .iter()
        .filter(|f| matcher.is_match(&f.path))
        .map(|f| f.path.clone())
        .collect();
    entries.sort();
    entries.dedup();
    Ok(entries)
}

/// How a file's content is interpreted during traversal. Anything that is
/// neither code nor a stylesheet is an opaque leaf: reached means used, but
/// never parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Loader {
    Script,
    Stylesheet,
    Leaf,
}

fn loader_for(path: &str) -> Loader {
    let ext = path.rsplit('/').next().and_then(|n| n.rsplit_once('.')).map(|(_, e)| e);
    match ext {
        Some("ts" | "tsx" | "js" | "jsx" | "mjs" | "cjs") => Loader::Script,
        Some("css" | "scss") => Loader::Stylesheet,
        _ => Loader::Leaf,
    }
}

/// Transitive closure over static and dynamic imports, starting from the
/// entry files. Declared external packages are boundaries. Returns the set of
/// repo-relative paths loaded to satisfy the entries, entries included.
pub fn reachable(
    root: &Path,
    files: &[RepoFile],
    entries: &[String],
    externals: &[String],
    extensions: &[String],
) -> Result<BTreeSet<String>> {
    let resolver = Resolver::new(root, files, externals, extensions);
    let style_imports = Regex::new(r#"@import\s+["']([^"']+)["']"#).expect("regex");
    let style_urls = Regex::new(r"url\(([^)]+)\)").expect("regex");

    let mut used: BTreeSet<String> = BTreeSet::new();
    let mut stack: Vec<String> = entries.to_vec();

    while let Some(current) = stack.pop() {
        if !used.insert(current.clone()) {
            continue;
        }
        match loader_for(&current) {
            Loader::Leaf => {}
            Loader::Script => {
                for spec in script_specifiers(root, &current)? {
                    if let Some(target) = resolver.resolve(&current, &spec) {
                        stack.push(target);
                    }
                }
            }
            Loader::Stylesheet => {
                let content = fs::read_to_string(root.join(&current))
                    .with_context(|| format!("failed reading {current}"))?;
                let mut specs: Vec<String> = Vec::new();
                for cap in style_imports.captures_iter(&content) {
                    specs.push(cap[1].to_string());
                }
                for cap in style_urls.captures_iter(&content) {
                    let val = cap[1].trim().trim_matches(|c| c == '"' || c == '\'');
                    specs.push(val.to_string());
                }
                for spec in specs {
                    if spec.starts_with("http://")
                        || spec.starts_with("https://")
                        || spec.starts_with("data:")
                    {
                        continue;
                    }
                    if let Some(target) = resolver.resolve(&current, &spec) {
                        stack.push(target);
                    }
                }
            }
        }
    }

    Ok(used)
}

/// Import specifiers of one script file, from the parser's module record:
/// static imports, re-exports, literal dynamic imports, and require() calls.
/// A parser panic on malformed source aborts the whole run rather than
/// under-reporting usage.
fn script_specifiers(root: &Path, rel: &str) -> Result<Vec<String>> {
    let abs = root.join(rel);
    let content =
        fs::read_to_string(&abs).with_context(|| format!("failed reading {rel}"))?;
    let source_type = SourceType::from_path(&abs).unwrap_or_else(|_| SourceType::default());

    let allocator = Allocator::new();
    let ret = Parser::new(&allocator, &content, source_type).parse();
    if ret.panicked {
        let message = ret
            .errors
            .first()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unrecoverable parse error".to_string());
        return Err(PruneError::Graph {
            file: rel.to_string(),
            message,
        }
        .into());
    }

    let mut specs: Vec<String> = Vec::new();
    let record = ret.module_record;

    for requested in record.requested_modules.keys() {
        specs.push(requested.to_string());
    }

    for dyn_import in &record.dynamic_imports {
        let expr = span_text(&content, dyn_import.module_request).trim();
        if let Some(spec) = string_literal(expr) {
            specs.push(spec);
        }
        // Non-literal dynamic imports cannot be followed statically; the
        // textual scanner still sees any path strings inside them.
    }

    let require = Regex::new(r#"require\(\s*['"]([^'"]+)['"]\s*\)"#).expect("regex");
    for cap in require.captures_iter(&content) {
        specs.push(cap[1].to_string());
    }

    specs.sort();
    specs.dedup();
    Ok(specs)
}

fn span_text<'a>(source: &'a str, span: Span) -> &'a str {
    let start = span.start as usize;
    let end = span.end as usize;
    if start >= end || end > source.len() {
        return "";
    }
    &source[start..end]
}

fn string_literal(expr: &str) -> Option<String> {
    let trimmed = expr.trim();
    if trimmed.len() < 2 {
        return None;
    }
    let first = trimmed.as_bytes()[0];
    let last = *trimmed.as_bytes().last()?;
    if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
        return Some(trimmed[1..trimmed.len() - 1].to_string());
    }
    None
}

struct Resolver {
    files: BTreeSet<String>,
    externals: Vec<String>,
    extensions: Vec<String>,
    ts_paths: TsPaths,
}

impl Resolver {
    fn new(root: &Path, files: &[RepoFile], externals: &[String], extensions: &[String]) -> Self {
        Self {
            files: files.iter().map(|f| f.path.clone()).collect(),
            externals: externals.to_vec(),
            extensions: extensions.to_vec(),
            ts_paths: load_ts_paths(root),
        }
    }

    fn resolve(&self, from: &str, raw: &str) -> Option<String> {
        if raw.starts_with('.') {
            let parent = match from.rsplit_once('/') {
                Some((dir, _)) => dir,
                None => "",
            };
            let joined = if parent.is_empty() {
                raw.to_string()
            } else {
                format!("{parent}/{raw}")
            };
            return self.probe(&normalize_rel(&joined));
        }

        if raw.starts_with('/') {
            return self.probe(&public_rooted(raw));
        }

        if self.is_external(raw) {
            return None;
        }

        if let Some(target) = self.resolve_ts_alias(raw) {
            return Some(target);
        }

        // Remaining bare specifiers are packages; never traversed.
        None
    }

    fn is_external(&self, raw: &str) -> bool {
        self.externals.iter().any(|pat| {
            if let Some(prefix) = pat.strip_suffix("/*") {
                raw == prefix || raw.starts_with(&format!("{prefix}/"))
            } else {
                raw == pat || raw.starts_with(&format!("{pat}/"))
            }
        })
    }

    fn resolve_ts_alias(&self, raw: &str) -> Option<String> {
        for (alias, targets) in &self.ts_paths.mappings {
            if let Some(star) = alias.find('*') {
                let prefix = &alias[..star];
                let suffix = &alias[star + 1..];
                if raw.starts_with(prefix) && raw.ends_with(suffix) {
                    let middle = &raw[prefix.len()..raw.len() - suffix.len()];
                    for target in targets {
                        let expanded = target.replace('*', middle);
                        if let Some(hit) = self.probe_under_base(&expanded) {
                            return Some(hit);
                        }
                    }
                }
            } else if alias == raw {
                for target in targets {
                    if let Some(hit) = self.probe_under_base(target) {
                        return Some(hit);
                    }
                }
            }
        }
        None
    }

    fn probe_under_base(&self, target: &str) -> Option<String> {
        let base = &self.ts_paths.base_url;
        let joined = if base.is_empty() {
            target.to_string()
        } else {
            format!("{base}/{target}")
        };
        self.probe(&normalize_rel(&joined))
    }

    fn probe(&self, base: &str) -> Option<String> {
        if self.files.contains(base) {
            return Some(base.to_string());
        }
        for ext in &self.extensions {
            let with_ext = format!("{base}.{ext}");
            if self.files.contains(&with_ext) {
                return Some(with_ext);
            }
        }
        for ext in &self.extensions {
            let index = format!("{base}/index.{ext}");
            if self.files.contains(&index) {
                return Some(index);
            }
        }
        None
    }
}

#[derive(Debug, Clone, Default)]
struct TsPaths {
    base_url: String,
    mappings: Vec<(String, Vec<String>)>,
}

/// compilerOptions.baseUrl/paths from tsconfig.json. Parse failures degrade
/// to no aliases (tsconfig is often JSONC; the relative-import fallback and
/// the validation oracle cover the gap).
fn load_ts_paths(root: &Path) -> TsPaths {
    let Ok(raw) = fs::read_to_string(root.join("tsconfig.json")) else {
        return TsPaths::default();
    };
    let Ok(v) = serde_json::from_str::<serde_json::Value>(&raw) else {
        return TsPaths::default();
    };
    let opts = v.get("compilerOptions");

    let base_url = opts
        .and_then(|o| o.get("baseUrl"))
        .and_then(|b| b.as_str())
        .map(|b| normalize_rel(b))
        .unwrap_or_default();

    let mut mappings = Vec::new();
    if let Some(paths) = opts.and_then(|o| o.get("paths")).and_then(|p| p.as_object()) {
        for (alias, vals) in paths {
            let targets = vals
                .as_array()
                .into_iter()
                .flat_map(|a| a.iter())
                .filter_map(|x| x.as_str())
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>();
            mappings.push((alias.clone(), targets));
        }
    }

    TsPaths { base_url, mappings }
}

/// Collapse `.` and `..` segments of a forward-slash relative path.
pub fn normalize_rel(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}
