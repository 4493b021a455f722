use crate::count::{Counts, count};
use crate::flatten::{Flattener, TitleMatch};
use crate::node::Node;
use crate::records::normalize_url;
use serde::Serialize;
use std::collections::HashMap;

/// Read-only findings about a bookmark forest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Anomalies {
    pub counts: Counts,
    /// Copies beyond the first of every normalized URL.
    pub duplicate_urls: usize,
    pub empty_folders: usize,
    /// Folders a repair would collapse into their same-titled parent.
    pub nested_same_title: usize,
}

impl Anomalies {
    pub fn total_issues(&self) -> usize {
        self.duplicate_urls + self.empty_folders + self.nested_same_title
    }
}

pub fn inspect(nodes: &[Node], title_match: TitleMatch) -> Anomalies {
    let mut url_counts: HashMap<String, usize> = HashMap::new();
    let mut empty_folders = 0;
    let mut pending: Vec<&Node> = nodes.iter().collect();

    while let Some(node) = pending.pop() {
        match node {
            Node::Bookmark(bookmark) => {
                *url_counts.entry(normalize_url(&bookmark.url)).or_insert(0) += 1;
            }
            Node::Folder(folder) => {
                if folder.children.is_empty() {
                    empty_folders += 1;
                }
                pending.extend(&folder.children);
            }
        }
    }

    let (_, stats) = Flattener::new()
        .with_title_match(title_match)
        .flatten_with_stats(nodes);

    Anomalies {
        counts: count(nodes),
        duplicate_urls: url_counts.values().map(|c| c - 1).sum(),
        empty_folders,
        nested_same_title: stats.folders_collapsed,
    }
}
