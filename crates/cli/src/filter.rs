//! Dispatch-side path filtering
//!
//! Two sources of rules, applied relative to the watched directory a path
//! belongs to:
//! 1. Built-in hidden/temp rules: any `.dot` component or a `temp~` file
//!    name (disabled by `--all`)
//! 2. Configured patterns in gitignore syntax (always active)

use anyhow::{Context, Result};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::cmp::Reverse;
use std::path::{Component, Path, PathBuf};

struct Root {
    path: PathBuf,
    patterns: Gitignore,
}

/// Decides which event paths are worth dispatching
pub struct PathFilter {
    roots: Vec<Root>,
    show_all: bool,
}

impl PathFilter {
    /// Build a filter for the given watched directories
    pub fn new(roots: Vec<PathBuf>, show_all: bool, patterns: &[String]) -> Result<Self> {
        let mut built = Vec::with_capacity(roots.len());

        for root in roots {
            // Backends may report canonical paths (e.g. /private/var on macOS)
            let canonical = std::fs::canonicalize(&root).ok().filter(|c| *c != root);

            for path in std::iter::once(root).chain(canonical) {
                let mut builder = GitignoreBuilder::new(&path);
                for pattern in patterns {
                    builder
                        .add_line(None, pattern)
                        .with_context(|| format!("Invalid ignore pattern: {}", pattern))?;
                }
                let patterns = builder.build().context("Failed to build ignore patterns")?;
                built.push(Root { path, patterns });
            }
        }

        // Nested roots: the most specific one wins
        built.sort_by_key(|root| Reverse(root.path.components().count()));

        Ok(Self {
            roots: built,
            show_all,
        })
    }

    /// Check if the path should not be dispatched
    pub fn is_ignored(&self, path: &Path) -> bool {
        let root = self.roots.iter().find(|root| path.starts_with(&root.path));
        let relative = root
            .and_then(|root| path.strip_prefix(&root.path).ok())
            .unwrap_or(path);

        if !self.show_all && is_hidden_or_temp(relative) {
            return true;
        }

        match root {
            Some(root) if !relative.as_os_str().is_empty() => root
                .patterns
                .matched_path_or_any_parents(relative, path.is_dir())
                .is_ignore(),
            _ => false,
        }
    }
}

/// `.dot` files or directories anywhere below the root, and `temp~` files
fn is_hidden_or_temp(relative: &Path) -> bool {
    let temp = relative
        .file_name()
        .map(|name| name.to_string_lossy().ends_with('~'))
        .unwrap_or(false);

    temp || relative.components().any(|component| match component {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}
