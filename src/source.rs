//! Docs tree → parsed documents → `Ir`.
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::Config;
use crate::document::Document;
use crate::error::Result;
use crate::extract::{PartialIr, extract_all};
use crate::ir::Ir;
use crate::merge::merge_all;

/// One markdown file under the docs root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Relative to the root, `/`-separated.
    pub relative: String,
    pub path: PathBuf,
}

/// Every `*.md` below `root`, sorted by relative path. This order is the
/// dedup tie-break, so it must not depend on the filesystem.
pub fn discover(root: &Path) -> Result<Vec<SourceFile>> {
    let escaped = glob::Pattern::escape(&root.to_string_lossy());
    let pattern = format!("{}/**/*.md", escaped.trim_end_matches('/'));
    let mut files = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry?;
        if !path.is_file() {
            continue;
        }
        let relative = relative_path(root, &path);
        files.push(SourceFile { relative, path });
    }
    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    Ok(files)
}

fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Read and parse one file. Unreadable files are skipped, not fatal.
pub fn load(file: &SourceFile) -> Option<Document> {
    match std::fs::read_to_string(&file.path) {
        Ok(markdown) => Some(Document::parse(file.relative.clone(), markdown)),
        Err(error) => {
            warn!(path = %file.path.display(), %error, "skipping unreadable file");
            None
        }
    }
}

/// Parse and extract every file in parallel. Output keeps `files` order.
pub fn extract_files(files: &[SourceFile], config: &Config) -> Result<Vec<PartialIr>> {
    let partitions = config.partitions.compile()?;
    Ok(files
        .par_iter()
        .filter_map(|file| load(file).map(|doc| extract_all(&doc, config, &partitions)))
        .collect())
}

/// The whole pipeline over a docs root.
pub fn extract_tree(root: &Path, config: &Config) -> Result<Ir> {
    let files = discover(root)?;
    info!(root = %root.display(), files = files.len(), "extracting");
    let partials = extract_files(&files, config)?;
    Ok(merge_all(config, &partials))
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    #[test]
    fn discovery_is_sorted_relative_and_md_only() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "resources/User.md", "# User");
        write(dir.path(), "resources/Channel.md", "# Channel");
        write(dir.path(), "interactions/Receiving_and_Responding.md", "# R");
        write(dir.path(), "resources/notes.txt", "ignored");
        let files = discover(dir.path()).unwrap();
        let rels: Vec<_> = files.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(rels, vec![
            "interactions/Receiving_and_Responding.md",
            "resources/Channel.md",
            "resources/User.md",
        ]);
    }

    #[test]
    fn missing_root_is_an_empty_tree() {
        let dir = tempfile::tempdir().unwrap();
        let ir = extract_tree(&dir.path().join("absent"), &Config::empty()).unwrap();
        assert_eq!(ir, Ir::default());
    }

    #[test]
    fn parallel_extraction_keeps_file_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["A", "B", "C", "D"] {
            write(dir.path(), &format!("resources/{name}.md"), "# x");
        }
        let files = discover(dir.path()).unwrap();
        let partials = extract_files(&files, &Config::empty()).unwrap();
        let paths: Vec<_> = partials.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["resources/A.md", "resources/B.md", "resources/C.md", "resources/D.md"]);
    }
}
