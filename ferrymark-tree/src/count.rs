use crate::node::Node;
use serde::{Deserialize, Serialize};

/// Bookmark and folder totals for a tree or forest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub bookmarks: usize,
    pub folders: usize,
}

/// Counts every bookmark and every folder (empty folders included), visiting
/// each node exactly once.
pub fn count(nodes: &[Node]) -> Counts {
    let mut counts = Counts::default();
    let mut pending: Vec<&Node> = nodes.iter().collect();

    while let Some(node) = pending.pop() {
        match node {
            Node::Bookmark(_) => counts.bookmarks += 1,
            Node::Folder(folder) => {
                counts.folders += 1;
                pending.extend(&folder.children);
            }
        }
    }

    counts
}
