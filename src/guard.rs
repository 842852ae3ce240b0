use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::config::{CONFIG_FILE, KEEP_FILE};

/// Shell-style matcher over repo-relative paths. `*` stops at separators,
/// `**` crosses them, braces and dotfiles work as in the original globs.
#[derive(Debug, Clone)]
pub struct Matcher {
    set: GlobSet,
}

impl Matcher {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for p in patterns {
            let p = p.as_ref();
            let glob = GlobBuilder::new(p)
                .literal_separator(true)
                .build()
                .with_context(|| format!("invalid glob: {p}"))?;
            builder.add(glob);
        }
        Ok(Self {
            set: builder.build().context("failed to build glob set")?,
        })
    }

    /// Like `new`, but silently drops invalid patterns. Used for the
    /// user-supplied keep rules, which degrade rather than abort.
    pub fn lenient<S: AsRef<str>>(patterns: &[S]) -> Self {
        let mut builder = GlobSetBuilder::new();
        for p in patterns {
            if let Ok(glob) = GlobBuilder::new(p.as_ref()).literal_separator(true).build() {
                builder.add(glob);
            }
        }
        Self {
            set: builder.build().unwrap_or_else(|_| GlobSet::empty()),
        }
    }

    pub fn is_match(&self, rel: &str) -> bool {
        self.set.is_match(rel)
    }
}

/// Files that are either invisible to static analysis (loaded by framework
/// convention) or catastrophic to delete. Always forced into the used set.
pub fn guardrail_patterns() -> Vec<String> {
    [
        ".next/**",
        ".git/**",
        ".vscode/**",
        "node_modules/**",
        "prune-report.*",
        KEEP_FILE,
        CONFIG_FILE,
        // Configs
        ".env*",
        "next.config.*",
        "tsconfig.*",
        "postcss.config.*",
        "tailwind.config.*",
        ".eslintrc*",
        ".prettierrc*",
        "prettier.config.*",
        ".prettier*",
        ".stylelintrc*",
        "package.json",
        "package-lock.json",
        "pnpm-lock.yaml",
        "yarn.lock",
        // Public must-keep
        "public/favicon.*",
        "public/favicon.ico",
        "public/robots.txt",
        "public/manifest.*",
        "public/apple-*",
        "public/opengraph*",
        "public/twitter*",
        "public/icon.*",
        // Next route framework files
        "app/**/layout.*",
        "app/**/template.*",
        "app/**/page.*",
        "app/**/route.*",
        "app/**/loading.*",
        "app/**/error.*",
        "app/**/not-found.*",
        "middleware.*",
    ]
    .map(String::from)
    .to_vec()
}

/// Protected unless --include-tests is passed.
pub fn test_like_patterns() -> Vec<String> {
    ["**/*.test.*", "**/*.spec.*", "**/*.stories.*", "__tests__/**"]
        .map(String::from)
        .to_vec()
}
