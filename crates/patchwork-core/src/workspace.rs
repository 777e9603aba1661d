//! Open documents, keyed by path
//!
//! Documents are immutable snapshots behind `Arc`. Updating a path swaps in
//! a new snapshot; anyone still holding the previous `Arc<Document>` keeps
//! reading the tree they started with.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;

use crate::Result;
use crate::cst::SyntaxTree;
use crate::error::PatchworkError;

/// One document snapshot
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub tree: SyntaxTree,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, tree: SyntaxTree) -> Self {
        Self {
            path: path.into(),
            tree,
        }
    }

    pub fn text(&self) -> String {
        self.tree.text()
    }
}

/// Concurrent document cache
#[derive(Debug, Default)]
pub struct Workspace {
    documents: DashMap<PathBuf, Arc<Document>>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `text` and cache it under `path`, replacing any open snapshot
    pub fn open(&self, path: impl Into<PathBuf>, text: &str) -> Arc<Document> {
        let path = path.into();
        let document = Arc::new(Document::new(path.clone(), SyntaxTree::parse(text)));
        tracing::debug!("Opened {} as {}", path.display(), document.tree.id());
        self.documents.insert(path, Arc::clone(&document));
        document
    }

    /// Read a file from disk and open it
    pub fn open_file(&self, path: &Path) -> Result<Arc<Document>> {
        let text =
            std::fs::read_to_string(path).map_err(|e| PatchworkError::io_error(path, e))?;
        Ok(self.open(path, &text))
    }

    pub fn get(&self, path: &Path) -> Option<Arc<Document>> {
        self.documents.get(path).map(|entry| Arc::clone(entry.value()))
    }

    /// Replace the tree of an open document
    ///
    /// Returns `None` when `path` is not open.
    pub fn update(&self, path: &Path, tree: SyntaxTree) -> Option<Arc<Document>> {
        let mut entry = self.documents.get_mut(path)?;
        let document = Arc::new(Document::new(path, tree));
        tracing::debug!(
            "Updated {}: {} -> {}",
            path.display(),
            entry.tree.id(),
            document.tree.id()
        );
        *entry = Arc::clone(&document);
        Some(document)
    }

    pub fn close(&self, path: &Path) -> Option<Arc<Document>> {
        self.documents.remove(path).map(|(_, document)| document)
    }

    /// Open paths, sorted
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.documents.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }

    /// Snapshot of every open document, sorted by path
    pub fn documents(&self) -> Vec<Arc<Document>> {
        let mut documents: Vec<Arc<Document>> =
            self.documents.iter().map(|e| Arc::clone(e.value())).collect();
        documents.sort_by(|a, b| a.path.cmp(&b.path));
        documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_is_copy_on_write() {
        let workspace = Workspace::new();
        let before = workspace.open("a.cs", "class A { }");
        let edited = SyntaxTree::parse("class B { }");
        let after = workspace
            .update(Path::new("a.cs"), edited)
            .expect("open document");

        assert_eq!(before.text(), "class A { }");
        assert_eq!(after.text(), "class B { }");
        assert_eq!(
            workspace.get(Path::new("a.cs")).map(|d| d.text()).as_deref(),
            Some("class B { }")
        );
    }

    #[test]
    fn test_update_requires_open_document() {
        let workspace = Workspace::new();
        assert!(workspace
            .update(Path::new("missing.cs"), SyntaxTree::parse(""))
            .is_none());
    }

    #[test]
    fn test_paths_are_sorted_and_close_removes() {
        let workspace = Workspace::new();
        workspace.open("b.cs", "");
        workspace.open("a.cs", "");
        assert_eq!(workspace.paths(), vec![PathBuf::from("a.cs"), PathBuf::from("b.cs")]);

        assert!(workspace.close(Path::new("a.cs")).is_some());
        assert_eq!(workspace.len(), 1);
        assert!(workspace.get(Path::new("a.cs")).is_none());
    }

    #[test]
    fn test_open_file_reads_from_disk() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("c.cs");
        std::fs::write(&path, "enum E { A }")?;

        let workspace = Workspace::new();
        let document = workspace.open_file(&path)?;
        assert_eq!(document.text(), "enum E { A }");

        let missing = workspace.open_file(&dir.path().join("missing.cs"));
        assert!(matches!(missing, Err(PatchworkError::IoError { .. })));
        Ok(())
    }
}
