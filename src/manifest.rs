use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use regex::Regex;
use serde_json::Value;

/// Paths mentioned inside `package.json` script commands. Keeps automation
/// scripts with no static import from being flagged as dead. A missing or
/// unparseable manifest degrades to the empty set.
pub fn script_refs(root: &Path) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    let Some(manifest) = read_manifest(root) else {
        return out;
    };
    let Some(scripts) = manifest.get("scripts").and_then(Value::as_object) else {
        return out;
    };

    let token = Regex::new(r"^[\w./\\:-]+\.(?:js|ts|mjs|cjs|sh|ps1|bat)$").expect("regex");
    for command in scripts.values().filter_map(Value::as_str) {
        for tok in command.split_whitespace() {
            if !token.is_match(tok) {
                continue;
            }
            let mut path = tok.replace('\\', "/");
            if let Some(stripped) = path.strip_prefix("./") {
                path = stripped.to_string();
            }
            if path.starts_with("http://") || path.starts_with("https://") {
                continue;
            }
            out.insert(path);
        }
    }
    out
}

/// True when the manifest declares a script with the given name.
pub fn has_script(root: &Path, name: &str) -> bool {
    read_manifest(root)
        .and_then(|m| m.get("scripts")?.get(name).cloned())
        .is_some()
}

fn read_manifest(root: &Path) -> Option<Value> {
    let raw = fs::read_to_string(root.join("package.json")).ok()?;
    serde_json::from_str(&raw).ok()
}
