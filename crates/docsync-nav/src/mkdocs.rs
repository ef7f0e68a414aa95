//! mkdocs-style `nav:` parsing.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::{debug, warn};

use crate::NavError;
use crate::node::NavNode;
use crate::scan;
use crate::tree::NavTree;

/// Build the navigation tree for a documentation project.
///
/// Reads the `nav:` list of `mkdocs_file` and appends every markdown file
/// under `docs_dir` that the list doesn't reference as an undeclared page.
/// Without a `nav:` key (or without the file) the tree mirrors the
/// directory structure of `docs_dir`.
///
/// Entries pointing to external URLs are skipped.
///
/// # Errors
///
/// Returns an error if the file can't be read, isn't YAML, or has an entry
/// that is neither a path, a `{title: path}` pair, nor a titled section.
pub fn load_mkdocs_nav(mkdocs_file: &Path, docs_dir: &Path) -> Result<NavTree, NavError> {
    if !mkdocs_file.exists() {
        debug!(path = %mkdocs_file.display(), "No navigation file, using directory structure");
        return Ok(NavTree::new(scan::directory_nav(docs_dir)?));
    }

    let content = std::fs::read_to_string(mkdocs_file).map_err(|source| NavError::Io {
        path: mkdocs_file.to_path_buf(),
        source,
    })?;
    let value: Value = serde_yaml::from_str(&content).map_err(|source| NavError::Yaml {
        path: mkdocs_file.to_path_buf(),
        source,
    })?;

    let Some(Value::Sequence(entries)) = value.get("nav") else {
        return Ok(NavTree::new(scan::directory_nav(docs_dir)?));
    };

    let mut tree = NavTree::default();
    for entry in entries {
        parse_entry(entry, 0, &mut tree)?;
    }
    append_orphans(&mut tree, docs_dir)?;
    Ok(tree)
}

fn parse_entry(entry: &Value, depth: usize, tree: &mut NavTree) -> Result<(), NavError> {
    match entry {
        Value::String(path) => {
            if !is_external(path) {
                tree.push(NavNode::page(None, path, depth));
            }
        }
        Value::Mapping(map) => {
            for (key, value) in map {
                let title = key
                    .as_str()
                    .ok_or_else(|| NavError::InvalidEntry(format!("{key:?}")))?;
                match value {
                    Value::String(path) if is_external(path) => {}
                    Value::String(path) => tree.push(NavNode::page(Some(title), path, depth)),
                    Value::Sequence(children) => {
                        tree.push(NavNode::section(title, depth));
                        for child in children {
                            parse_entry(child, depth + 1, tree)?;
                        }
                    }
                    other => return Err(NavError::InvalidEntry(format!("{title}: {other:?}"))),
                }
            }
        }
        other => return Err(NavError::InvalidEntry(format!("{other:?}"))),
    }
    Ok(())
}

fn append_orphans(tree: &mut NavTree, docs_dir: &Path) -> Result<(), NavError> {
    let declared: HashSet<PathBuf> = tree.nodes().iter().filter_map(|n| n.path.clone()).collect();

    for path in scan::markdown_files(docs_dir)? {
        if !declared.contains(&path) {
            warn!(
                path = %path.display(),
                "Page has no entry in the nav section; it is uploaded but may be unreachable from the navigation"
            );
            tree.push(NavNode::page(None, path, 0));
        }
    }
    Ok(())
}

fn is_external(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}
