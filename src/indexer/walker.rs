//! Eligible-file enumeration for an indexing scope.

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::extractor::grammars::SpecRegistry;

/// Directory names never descended into, independent of gitignore state.
const SKIP_DIRS: &[&str] = &[
    ".git",
    ".venv",
    "__pycache__",
    "build",
    "dist",
    "node_modules",
    "target",
    "vendor",
];

/// Generated-file name patterns that are never worth indexing.
const GENERATED_PATTERNS: &[&str] = &[
    "*.min.js",
    "*.min.css",
    "*.pb.go",
    "*_pb2.py",
    "*.generated.*",
    "package-lock.json",
];

/// Walks a scope honoring gitignore rules, the static skip lists, and any
/// configured extra ignore patterns, keeping only files whose extension
/// resolves to a registered grammar.
pub struct Walker {
    scope: PathBuf,
    ignored_names: GlobSet,
}

impl Walker {
    pub fn new(scope: &Path, extra_ignores: &[String]) -> Self {
        let mut builder = GlobSetBuilder::new();
        for pattern in GENERATED_PATTERNS
            .iter()
            .copied()
            .chain(extra_ignores.iter().map(String::as_str))
        {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => warn!(pattern, "invalid ignore pattern: {e}"),
            }
        }
        let ignored_names = builder.build().unwrap_or_else(|_| GlobSet::empty());

        Self {
            scope: scope.to_path_buf(),
            ignored_names,
        }
    }

    /// Enumerate eligible files in deterministic (sorted) order.
    pub fn files(&self, registry: &SpecRegistry) -> Vec<PathBuf> {
        let mut builder = WalkBuilder::new(&self.scope);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .filter_entry(|entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                if !is_dir {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                !SKIP_DIRS.contains(&name.as_ref())
            });

        let mut files = Vec::new();
        for entry in builder.build().filter_map(|e| e.ok()) {
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            if registry.grammar_for_path(path).is_none() {
                continue;
            }
            if let Some(name) = path.file_name() {
                if self.ignored_names.is_match(Path::new(name)) {
                    continue;
                }
            }
            files.push(path.to_path_buf());
        }

        files.sort();
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_walker_filters_by_extension_and_skip_lists() {
        let dir = tempdir().unwrap();
        let root = dir.path();

        touch(root, "src/main.rs");
        touch(root, "src/api.ts");
        touch(root, "README.md");
        touch(root, "node_modules/lib/index.js");
        touch(root, "target/debug/gen.rs");
        touch(root, "web/app.min.js");
        touch(root, "proto/svc.pb.go");

        let registry = SpecRegistry::new();
        let walker = Walker::new(root, &[]);
        let files: Vec<String> = walker
            .files(&registry)
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();

        assert_eq!(files, vec!["src/api.ts", "src/main.rs"]);
    }

    #[test]
    fn test_walker_extra_ignores() {
        let dir = tempdir().unwrap();
        let root = dir.path();

        touch(root, "a.rs");
        touch(root, "a_test.rs");

        let registry = SpecRegistry::new();
        let walker = Walker::new(root, &["*_test.rs".to_string()]);
        let files = walker.files(&registry);

        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.rs"));
    }
}
