use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::Result;
use regex::Regex;

use crate::config::{self, EffectiveConfig};
use crate::guard::{self, Matcher};
use crate::model::{ReferenceHit, RepoFile};
use crate::textscan::{self, public_rooted};
use crate::{graph, manifest, walker};

/// One run's evidence, threaded as plain values so the classifier stays pure
/// and a re-run against an unchanged tree reproduces the same output.
#[derive(Debug)]
pub struct Analysis {
    pub files: Vec<RepoFile>,
    pub used: BTreeSet<String>,
    pub hits: BTreeMap<String, ReferenceHit>,
}

#[derive(Debug, Clone)]
pub struct Analyzer {
    cfg: EffectiveConfig,
}

impl Analyzer {
    pub fn new(cfg: EffectiveConfig) -> Self {
        Self { cfg }
    }

    /// Enumerate the tree, run the four evidence sources, and union their
    /// used sets. Graph failures abort; an incomplete used set here would
    /// turn into deleted live files in apply mode.
    pub fn analyze(&self, root: &Path) -> Result<Analysis> {
        let files = walker::enumerate(root, &self.cfg.ignore)?;

        let entries = graph::collect_entry_points(&files)?;
        let graph_used = if entries.is_empty() {
            BTreeSet::new()
        } else {
            graph::reachable(
                root,
                &files,
                &entries,
                &self.cfg.externals,
                &self.cfg.extensions,
            )?
        };

        let scan = textscan::scan(root, &files);
        let script_refs = manifest::script_refs(root);

        let mut used = graph_used;
        used.extend(scan.referenced);
        used.extend(script_refs);

        let guards = Matcher::new(&guard::guardrail_patterns())?;
        let keep = Matcher::lenient(&config::load_keep_rules(root));
        let tests = Matcher::new(&guard::test_like_patterns())?;

        for file in &files {
            let rel = file.path.as_str();
            if guards.is_match(rel) || keep.is_match(rel) {
                used.insert(rel.to_string());
            }
            if !self.cfg.include_tests && tests.is_match(rel) {
                used.insert(rel.to_string());
            }
            // Next colocation files are loaded by convention, not import.
            if rel.starts_with("app/") {
                let base = rel.rsplit('/').next().unwrap_or(rel);
                if base == "icons.ts" || base == "metadata.ts" {
                    used.insert(rel.to_string());
                }
            }
        }

        mark_font_faces(root, &files, &mut used);

        Ok(Analysis {
            files,
            used,
            hits: scan.hits,
        })
    }
}

/// Fonts declared via @font-face resolve at serve time with no import edge;
/// force them used whenever a stylesheet names them.
fn mark_font_faces(root: &Path, files: &[RepoFile], used: &mut BTreeSet<String>) {
    let re = Regex::new(r#"(?i)url\(\s*['"]?([^)'"]+\.(?:ttf|otf|woff2?))['"]?\s*\)"#)
        .expect("regex");
    for file in files {
        if !matches!(file.extension(), "css" | "scss") {
            continue;
        }
        let Ok(content) = fs::read_to_string(root.join(&file.path)) else {
            continue;
        };
        for cap in re.captures_iter(&content) {
            used.insert(public_rooted(cap[1].trim()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorPolicy;
    use crate::config::ValidateCommands;
    use crate::model::OutputFormat;
    use std::fs;
    use tempfile::tempdir;

    fn test_config() -> EffectiveConfig {
        EffectiveConfig {
            ignore: vec![
                "node_modules/**".into(),
                ".next/**".into(),
                ".git/**".into(),
                "__trash__/**".into(),
            ],
            extensions: ["ts", "tsx", "js", "jsx", "mjs", "cjs", "json", "css"]
                .map(String::from)
                .to_vec(),
            externals: ["next", "react", "react-dom"].map(String::from).to_vec(),
            include_tests: false,
            format: OutputFormat::Human,
            color: ColorPolicy::Never,
            validate: ValidateCommands::default(),
        }
    }

    #[test]
    fn guardrails_force_used_without_references() {
        let dir = tempdir().expect("tmp");
        fs::write(dir.path().join(".env.local"), "SECRET=1").expect("write");
        fs::write(dir.path().join("loose.ts"), "export const x = 1;").expect("write");

        let analysis = Analyzer::new(test_config()).analyze(dir.path()).expect("analyze");
        assert!(analysis.used.contains(".env.local"));
        assert!(!analysis.used.contains("loose.ts"));
    }

    #[test]
    fn keep_rules_force_used() {
        let dir = tempdir().expect("tmp");
        fs::create_dir_all(dir.path().join("scripts")).expect("mkdir");
        fs::create_dir_all(dir.path().join("archive")).expect("mkdir");
        fs::write(
            dir.path().join("scripts/prune-keep.yml"),
            "keep:\n  - archive/**\n",
        )
        .expect("write");
        fs::write(dir.path().join("archive/old.ts"), "export const x = 1;").expect("write");

        let analysis = Analyzer::new(test_config()).analyze(dir.path()).expect("analyze");
        assert!(analysis.used.contains("archive/old.ts"));
    }

    #[test]
    fn tests_protected_unless_included() {
        let dir = tempdir().expect("tmp");
        fs::write(dir.path().join("tree.test.ts"), "it('x', () => {});").expect("write");

        let protected = Analyzer::new(test_config()).analyze(dir.path()).expect("analyze");
        assert!(protected.used.contains("tree.test.ts"));

        let mut cfg = test_config();
        cfg.include_tests = true;
        let exposed = Analyzer::new(cfg).analyze(dir.path()).expect("analyze");
        assert!(!exposed.used.contains("tree.test.ts"));
    }

    #[test]
    fn colocation_files_under_app_kept() {
        let dir = tempdir().expect("tmp");
        fs::create_dir_all(dir.path().join("app/blog")).expect("mkdir");
        fs::write(dir.path().join("app/blog/metadata.ts"), "export const m = 1;").expect("write");
        fs::write(dir.path().join("app/blog/helper.ts"), "export const h = 1;").expect("write");

        let analysis = Analyzer::new(test_config()).analyze(dir.path()).expect("analyze");
        assert!(analysis.used.contains("app/blog/metadata.ts"));
        assert!(!analysis.used.contains("app/blog/helper.ts"));
    }

    #[test]
    fn font_face_urls_marked_used() {
        let dir = tempdir().expect("tmp");
        fs::create_dir_all(dir.path().join("styles")).expect("mkdir");
        fs::create_dir_all(dir.path().join("public/fonts")).expect("mkdir");
        fs::write(
            dir.path().join("styles/fonts.css"),
            "@font-face { font-family: X; src: url('/fonts/X.woff2'); }",
        )
        .expect("write");
        fs::write(dir.path().join("public/fonts/X.woff2"), [0u8; 8]).expect("write");

        let analysis = Analyzer::new(test_config()).analyze(dir.path()).expect("analyze");
        assert!(analysis.used.contains("public/fonts/X.woff2"));
    }

    #[test]
    fn script_refs_join_used_set() {
        let dir = tempdir().expect("tmp");
        fs::create_dir_all(dir.path().join("scripts")).expect("mkdir");
        fs::write(
            dir.path().join("package.json"),
            r#"{"scripts":{"migrate":"node scripts/migrate.js"}}"#,
        )
        .expect("write");
        fs::write(dir.path().join("scripts/migrate.js"), "process.exit(0);").expect("write");

        let analysis = Analyzer::new(test_config()).analyze(dir.path()).expect("analyze");
        assert!(analysis.used.contains("scripts/migrate.js"));
    }
}
