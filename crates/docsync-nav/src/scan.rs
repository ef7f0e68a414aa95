//! Markdown discovery by filesystem walking.

use std::fs;
use std::path::{Path, PathBuf};

use crate::NavError;
use crate::node::NavNode;

/// Docs-relative paths of every markdown file under `docs_dir`, sorted.
///
/// Returns an empty list if the directory doesn't exist.
pub(crate) fn markdown_files(docs_dir: &Path) -> Result<Vec<PathBuf>, NavError> {
    let mut files = Vec::new();
    if docs_dir.is_dir() {
        collect_markdown(docs_dir, Path::new(""), &mut files)?;
    }
    files.sort();
    Ok(files)
}

/// Navigation derived from directory structure alone.
///
/// Directories containing markdown become undeclared sections, files become
/// undeclared pages. Entries are sorted by name, files before directories.
pub(crate) fn directory_nav(docs_dir: &Path) -> Result<Vec<NavNode>, NavError> {
    let mut nodes = Vec::new();
    if docs_dir.is_dir() {
        walk_directory(docs_dir, Path::new(""), 0, &mut nodes)?;
    }
    Ok(nodes)
}

fn collect_markdown(dir: &Path, rel: &Path, out: &mut Vec<PathBuf>) -> Result<(), NavError> {
    for (path, is_dir) in sorted_entries(dir)? {
        let Some(name) = path.file_name() else {
            continue;
        };
        let rel_path = rel.join(name);
        if is_dir {
            collect_markdown(&path, &rel_path, out)?;
        } else if is_markdown(&path) {
            out.push(rel_path);
        }
    }
    Ok(())
}

fn walk_directory(
    dir: &Path,
    rel: &Path,
    depth: usize,
    out: &mut Vec<NavNode>,
) -> Result<(), NavError> {
    let entries = sorted_entries(dir)?;

    for (path, _) in entries.iter().filter(|(p, is_dir)| !is_dir && is_markdown(p)) {
        if let Some(name) = path.file_name() {
            out.push(NavNode::page(None, rel.join(name), depth));
        }
    }

    for (path, _) in entries.iter().filter(|(_, is_dir)| *is_dir) {
        let Some(name) = path.file_name() else {
            continue;
        };
        let rel_dir = rel.join(name);
        let mut children = Vec::new();
        walk_directory(path, &rel_dir, depth + 1, &mut children)?;
        if !children.is_empty() {
            out.push(NavNode::directory(rel_dir, depth));
            out.append(&mut children);
        }
    }
    Ok(())
}

/// Directory entries as (path, `is_dir`) pairs sorted by path.
fn sorted_entries(dir: &Path) -> Result<Vec<(PathBuf, bool)>, NavError> {
    let io_err = |source| NavError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
        entries.push((entry.path(), is_dir));
    }
    entries.sort();
    Ok(entries)
}

fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "md")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn write(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "# Title\n").unwrap();
    }

    #[test]
    fn test_markdown_files_sorted_and_relative() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.md");
        write(dir.path(), "a/z.md");
        write(dir.path(), "a/notes.txt");

        let files = markdown_files(dir.path()).unwrap();

        assert_eq!(files, [PathBuf::from("a/z.md"), PathBuf::from("b.md")]);
    }

    #[test]
    fn test_missing_dir_is_empty() {
        assert!(markdown_files(Path::new("/nonexistent/docs")).unwrap().is_empty());
        assert!(directory_nav(Path::new("/nonexistent/docs")).unwrap().is_empty());
    }

    #[test]
    fn test_directory_nav_structure() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.md");
        write(dir.path(), "guides/intro.md");
        write(dir.path(), "guides/deep/tuning.md");
        fs::create_dir_all(dir.path().join("empty")).unwrap();

        let nodes = directory_nav(dir.path()).unwrap();

        assert_eq!(
            nodes,
            [
                NavNode::page(None, "index.md", 0),
                NavNode::directory("guides", 0),
                NavNode::page(None, "guides/intro.md", 1),
                NavNode::directory("guides/deep", 1),
                NavNode::page(None, "guides/deep/tuning.md", 2),
            ]
        );
    }
}
