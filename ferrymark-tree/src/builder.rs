use crate::error::{Result, TreeError};
use crate::node::{Bookmark, Folder, Node};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Parent value marking the root row (NULL parents are treated the same way).
pub const ROOT_PARENT: i64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Bookmark,
    Folder,
    Separator,
    Other(i64),
}

impl RowKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => RowKind::Bookmark,
            2 => RowKind::Folder,
            3 => RowKind::Separator,
            other => RowKind::Other(other),
        }
    }
}

/// One relational bookmark row, already joined with its URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: i64,
    pub kind: RowKind,
    pub title: Option<String>,
    pub url: Option<String>,
}

impl Row {
    pub fn folder(id: i64, title: Option<&str>) -> Self {
        Self {
            id,
            kind: RowKind::Folder,
            title: title.map(String::from),
            url: None,
        }
    }

    pub fn bookmark(id: i64, title: Option<&str>, url: Option<&str>) -> Self {
        Self {
            id,
            kind: RowKind::Bookmark,
            title: title.map(String::from),
            url: url.map(String::from),
        }
    }
}

/// Read-only access to parent/child bookmark rows.
pub trait RowSource {
    /// Ids of every row whose parent is 0 or NULL.
    fn root_candidates(&self) -> Result<Vec<i64>>;

    /// Direct children of `parent`, ordered by position.
    fn children(&self, parent: i64) -> Result<Vec<Row>>;
}

/// What to do with a bookmark row that has no URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingUrlPolicy {
    /// Leave the row out of the tree.
    #[default]
    Drop,
    /// Abort the build.
    Fail,
}

impl MissingUrlPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "drop" => Some(MissingUrlPolicy::Drop),
            "fail" => Some(MissingUrlPolicy::Fail),
            _ => None,
        }
    }
}

/// In-memory parent id -> ordered children index.
#[derive(Debug, Clone, Default)]
pub struct RowIndex {
    roots: Vec<i64>,
    children: HashMap<i64, Vec<(i64, Row)>>,
    len: usize,
}

impl RowIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a row. `None` and `Some(0)` parents mark root candidates.
    pub fn insert(&mut self, parent: Option<i64>, position: i64, row: Row) {
        self.len += 1;
        match parent {
            None | Some(ROOT_PARENT) => self.roots.push(row.id),
            Some(parent) => {
                let siblings = self.children.entry(parent).or_default();
                let at = siblings.partition_point(|(p, _)| *p <= position);
                siblings.insert(at, (position, row));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl RowSource for RowIndex {
    fn root_candidates(&self) -> Result<Vec<i64>> {
        Ok(self.roots.clone())
    }

    fn children(&self, parent: i64) -> Result<Vec<Row>> {
        Ok(self
            .children
            .get(&parent)
            .map(|rows| rows.iter().map(|(_, row)| row.clone()).collect())
            .unwrap_or_default())
    }
}

struct Frame {
    folder: Option<(i64, Option<String>)>,
    rows: std::vec::IntoIter<Row>,
    built: Vec<Node>,
}

impl Frame {
    fn new(folder: Option<(i64, Option<String>)>, rows: Vec<Row>) -> Self {
        Self {
            folder,
            rows: rows.into_iter(),
            built: Vec::new(),
        }
    }
}

/// Assembles a typed tree from a [`RowSource`].
pub struct TreeBuilder<'a, S: RowSource + ?Sized> {
    source: &'a S,
    missing_url: MissingUrlPolicy,
}

impl<'a, S: RowSource + ?Sized> TreeBuilder<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            missing_url: MissingUrlPolicy::default(),
        }
    }

    pub fn with_missing_url(mut self, policy: MissingUrlPolicy) -> Self {
        self.missing_url = policy;
        self
    }

    /// The single row whose parent is 0 or NULL.
    pub fn resolve_root(&self) -> Result<i64> {
        match self.source.root_candidates()?.as_slice() {
            [root] => Ok(*root),
            [] => Err(TreeError::MissingRoot),
            many => Err(TreeError::AmbiguousRoot(many.len())),
        }
    }

    /// Builds the children of the resolved root.
    pub fn build(&self) -> Result<Vec<Node>> {
        let root = self.resolve_root()?;
        info!("Building bookmark tree from root row {}", root);
        self.build_children(root)
    }

    /// Builds the ordered, fully expanded children of `parent`.
    ///
    /// Traversal uses an explicit stack, so nesting depth is bounded by heap
    /// rather than by the call stack.
    pub fn build_children(&self, parent: i64) -> Result<Vec<Node>> {
        let mut ancestors = HashSet::from([parent]);
        let mut stack = vec![Frame::new(None, self.source.children(parent)?)];
        let mut dropped = 0usize;

        while let Some(frame) = stack.last_mut() {
            match frame.rows.next() {
                Some(row) => match row.kind {
                    RowKind::Folder => {
                        if !ancestors.insert(row.id) {
                            return Err(TreeError::Cycle(row.id));
                        }
                        let rows = self.source.children(row.id)?;
                        stack.push(Frame::new(Some((row.id, row.title)), rows));
                    }
                    RowKind::Bookmark => match row.url.as_deref().filter(|u| !u.is_empty()) {
                        Some(url) => frame.built.push(Node::Bookmark(Bookmark::from_source(
                            url,
                            row.title.as_deref(),
                        ))),
                        None => match self.missing_url {
                            MissingUrlPolicy::Drop => {
                                debug!("Dropping bookmark row {} without URL", row.id);
                                dropped += 1;
                            }
                            MissingUrlPolicy::Fail => return Err(TreeError::MissingUrl(row.id)),
                        },
                    },
                    RowKind::Separator | RowKind::Other(_) => {
                        debug!("Skipping row {} of kind {:?}", row.id, row.kind);
                    }
                },
                None => {
                    let Some(done) = stack.pop() else { break };
                    match done.folder {
                        Some((id, title)) => {
                            ancestors.remove(&id);
                            let folder = Folder::from_source(title.as_deref(), done.built);
                            if let Some(outer) = stack.last_mut() {
                                outer.built.push(Node::Folder(folder));
                            }
                        }
                        None => {
                            if dropped > 0 {
                                info!("Dropped {} bookmark rows without URL", dropped);
                            }
                            return Ok(done.built);
                        }
                    }
                }
            }
        }

        Ok(Vec::new())
    }
}
