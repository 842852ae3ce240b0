use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use regex::Regex;

use crate::model::{ReferenceHit, RepoFile};

/// Extensions scanned line by line for path-like string literals.
const TEXT_EXTS: &[&str] = &["ts", "tsx", "js", "jsx", "md", "mdx", "css", "scss"];

#[derive(Debug)]
pub struct ScanOutput {
    /// Targets with at least one non-comment occurrence. Comment-only
    /// mentions stay out of the used set so a stale comment cannot protect a
    /// file; they still lower the candidate's confidence via `hits`.
    pub referenced: BTreeSet<String>,
    pub hits: BTreeMap<String, ReferenceHit>,
}

/// Absolute references resolve under the public assets directory at serve
/// time; mirror that here.
pub fn public_rooted(val: &str) -> String {
    match val.strip_prefix('/') {
        Some(rest) => format!("public/{rest}"),
        None => val.to_string(),
    }
}

pub fn is_comment_line(ext: &str, line: &str) -> bool {
    let t = line.trim();
    match ext {
        "ts" | "tsx" | "js" | "jsx" => {
            t.starts_with("//") || t.starts_with("/*") || t.ends_with("*/")
        }
        "md" | "mdx" => t.starts_with("<!--") || t.ends_with("-->"),
        "css" | "scss" => t.starts_with("/*") || t.ends_with("*/"),
        _ => false,
    }
}

struct Patterns {
    src_attr: Regex,
    url: Regex,
    asset_str: Regex,
    font_path: Regex,
    asset_ext: Regex,
}

impl Patterns {
    fn new() -> Self {
        Self {
            // <img src="/..."> and next/image style attributes
            src_attr: Regex::new(r#"\bsrc\s*=\s*["'](/[^"']+)["']"#).expect("regex"),
            url: Regex::new(r"url\(([^)]+)\)").expect("regex"),
            // Plain string mentions of assets (loaders, configs)
            asset_str: Regex::new(
                r#"(?i)["']([^"']+\.(?:glb|gltf|hdr|png|jpg|jpeg|webp|svg|gif|mp4|mov|ttf|otf))["']"#,
            )
            .expect("regex"),
            // next/font/local src entries
            font_path: Regex::new(r#"path\s*:\s*["']([^"']+\.(?:ttf|otf|woff2?))["']"#)
                .expect("regex"),
            asset_ext: Regex::new(
                r"(?i)\.(?:glb|gltf|hdr|png|jpg|jpeg|webp|svg|gif|mp4|mov|ttf|otf)",
            )
            .expect("regex"),
        }
    }
}

pub fn scan(root: &Path, files: &[RepoFile]) -> ScanOutput {
    let patterns = Patterns::new();
    let mut hits: BTreeMap<String, ReferenceHit> = BTreeMap::new();

    let mut record = |target: String, src: &str, line_no: usize, comment: bool| {
        hits.entry(target)
            .or_default()
            .record(src, line_no, comment);
    };

    for file in files {
        let ext = file.extension();
        if !TEXT_EXTS.contains(&ext) {
            continue;
        }
        let Ok(content) = fs::read_to_string(root.join(&file.path)) else {
            continue;
        };
        for (idx, line) in content.lines().enumerate() {
            let line_no = idx + 1;
            let comment = is_comment_line(ext, line);

            for cap in patterns.src_attr.captures_iter(line) {
                record(public_rooted(&cap[1]), &file.path, line_no, comment);
            }
            for cap in patterns.url.captures_iter(line) {
                let val = cap[1].trim().trim_matches(|c| c == '"' || c == '\'');
                if patterns.asset_ext.is_match(val) {
                    record(public_rooted(val), &file.path, line_no, comment);
                }
            }
            for cap in patterns.asset_str.captures_iter(line) {
                record(public_rooted(&cap[1]), &file.path, line_no, comment);
            }
            for cap in patterns.font_path.captures_iter(line) {
                record(public_rooted(&cap[1]), &file.path, line_no, comment);
            }
        }
    }

    let referenced = hits
        .iter()
        .filter(|(_, h)| !h.comment_only)
        .map(|(path, _)| path.clone())
        .collect();

    ScanOutput { referenced, hits }
}
