use crate::node::{Folder, Node};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How two folder titles are compared when looking for redundant nesting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TitleMatch {
    /// Byte-for-byte equality.
    #[default]
    Exact,
    /// Equality after trimming surrounding whitespace.
    Trimmed,
    /// Trimmed, then compared lower-cased.
    CaseInsensitive,
}

impl TitleMatch {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "exact" => Some(TitleMatch::Exact),
            "trimmed" | "trim" => Some(TitleMatch::Trimmed),
            "case-insensitive" | "case_insensitive" | "nocase" => Some(TitleMatch::CaseInsensitive),
            _ => None,
        }
    }

    pub fn matches(&self, a: &str, b: &str) -> bool {
        match self {
            TitleMatch::Exact => a == b,
            TitleMatch::Trimmed => a.trim() == b.trim(),
            TitleMatch::CaseInsensitive => a.trim().to_lowercase() == b.trim().to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlattenStats {
    pub folders_seen: usize,
    pub folders_collapsed: usize,
}

struct Frame<'a> {
    folder: Option<&'a Folder>,
    pending: Vec<&'a Node>,
    built: Vec<Node>,
}

impl<'a> Frame<'a> {
    fn new(folder: Option<&'a Folder>, children: &'a [Node]) -> Self {
        Self {
            folder,
            pending: children.iter().rev().collect(),
            built: Vec::with_capacity(children.len()),
        }
    }
}

/// Collapses folders whose direct child is a folder with the same title.
///
/// The input is never modified; a new tree is returned. A chain of any
/// length of same-titled folders collapses into its outermost folder in a
/// single pass, so the result is a fixed point.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flattener {
    title_match: TitleMatch,
}

impl Flattener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title_match(mut self, title_match: TitleMatch) -> Self {
        self.title_match = title_match;
        self
    }

    pub fn flatten(&self, node: &Node) -> Node {
        self.flatten_forest(std::slice::from_ref(node))
            .into_iter()
            .next()
            .unwrap_or_else(|| node.clone())
    }

    pub fn flatten_forest(&self, nodes: &[Node]) -> Vec<Node> {
        self.flatten_with_stats(nodes).0
    }

    pub fn flatten_with_stats(&self, nodes: &[Node]) -> (Vec<Node>, FlattenStats) {
        let mut stats = FlattenStats::default();
        let mut stack = vec![Frame::new(None, nodes)];

        while let Some(frame) = stack.last_mut() {
            match frame.pending.pop() {
                Some(Node::Bookmark(bookmark)) => {
                    frame.built.push(Node::Bookmark(bookmark.clone()));
                }
                Some(Node::Folder(child)) => {
                    stats.folders_seen += 1;
                    let redundant = frame
                        .folder
                        .is_some_and(|outer| self.title_match.matches(&outer.title, &child.title));

                    if redundant {
                        debug!("Collapsing nested folder '{}'", child.title);
                        stats.folders_collapsed += 1;
                        frame.pending.extend(child.children.iter().rev());
                    } else {
                        stack.push(Frame::new(Some(child), &child.children));
                    }
                }
                None => {
                    let Some(done) = stack.pop() else { break };
                    let Some(folder) = done.folder else {
                        return (done.built, stats);
                    };
                    let rebuilt = Node::Folder(Folder {
                        title: folder.title.clone(),
                        uuid: folder.uuid.clone(),
                        children: done.built,
                    });
                    if let Some(outer) = stack.last_mut() {
                        outer.built.push(rebuilt);
                    }
                }
            }
        }

        (Vec::new(), stats)
    }
}
