use crate::node::{BookmarkRecord, Node};
use std::collections::HashSet;

/// Key used to decide whether two URLs point at the same place: trimmed,
/// lower-cased, fragment and one trailing slash removed.
pub fn normalize_url(url: &str) -> String {
    let mut normalized = url.trim().to_lowercase();
    if let Some(pos) = normalized.find('#') {
        normalized.truncate(pos);
    }
    if normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Every bookmark of the forest as a flat record, in document order.
pub fn collect_records(nodes: &[Node]) -> Vec<BookmarkRecord> {
    let mut records = Vec::new();
    let mut pending: Vec<&Node> = nodes.iter().rev().collect();

    while let Some(node) = pending.pop() {
        match node {
            Node::Bookmark(bookmark) => records.push(bookmark.record()),
            Node::Folder(folder) => pending.extend(folder.children.iter().rev()),
        }
    }

    records
}

/// Keeps the first record for every normalized URL.
pub fn dedupe_records(records: Vec<BookmarkRecord>) -> Vec<BookmarkRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(normalize_url(&record.url)))
        .collect()
}
