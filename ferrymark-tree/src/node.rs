use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to folders whose source title is missing or empty.
pub const DEFAULT_FOLDER_TITLE: &str = "Folder";

/// Number of URL characters used as a bookmark title when the source has none.
pub const URL_TITLE_CHARS: usize = 50;

/// Fresh upper-case v4 identifier, the form the property list format uses.
pub fn new_uuid() -> String {
    Uuid::new_v4().to_string().to_uppercase()
}

/// A bookmark tree element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Folder(Folder),
    Bookmark(Bookmark),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub title: String,
    pub uuid: String,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub url: String,
    pub title: String,
    pub uuid: String,
}

/// Flat `{url, title}` form of a bookmark, independent of tree shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkRecord {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
}

impl Folder {
    pub fn new(title: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            title: title.into(),
            uuid: new_uuid(),
            children,
        }
    }

    /// Builds a folder from a source title, substituting the placeholder
    /// when the title is missing or empty.
    pub fn from_source(title: Option<&str>, children: Vec<Node>) -> Self {
        let title = match title {
            Some(t) if !t.is_empty() => t,
            _ => DEFAULT_FOLDER_TITLE,
        };
        Self::new(title, children)
    }
}

// Nested folders are released from a work list so dropping a deep tree
// does not overflow the stack.
impl Drop for Folder {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(node) = pending.pop() {
            if let Node::Folder(mut folder) = node {
                pending.append(&mut folder.children);
            }
        }
    }
}

impl Bookmark {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            uuid: new_uuid(),
        }
    }

    /// Builds a bookmark from a source title, falling back to the first
    /// [`URL_TITLE_CHARS`] characters of the URL.
    pub fn from_source(url: &str, title: Option<&str>) -> Self {
        match title {
            Some(t) if !t.is_empty() => Self::new(url, t),
            _ => Self::new(url, url.chars().take(URL_TITLE_CHARS).collect::<String>()),
        }
    }

    pub fn record(&self) -> BookmarkRecord {
        BookmarkRecord {
            url: self.url.clone(),
            title: self.title.clone(),
        }
    }
}

impl Node {
    pub fn folder(title: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Folder(Folder::new(title, children))
    }

    pub fn bookmark(url: impl Into<String>, title: impl Into<String>) -> Self {
        Node::Bookmark(Bookmark::new(url, title))
    }

    pub fn title(&self) -> &str {
        match self {
            Node::Folder(f) => &f.title,
            Node::Bookmark(b) => &b.title,
        }
    }

    pub fn uuid(&self) -> &str {
        match self {
            Node::Folder(f) => &f.uuid,
            Node::Bookmark(b) => &b.uuid,
        }
    }

    /// Direct children; always empty for bookmarks.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Folder(f) => &f.children,
            Node::Bookmark(_) => &[],
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Node::Folder(_))
    }

    /// Structural equality on shape, titles and URLs. Identifiers are ignored.
    pub fn same_shape(&self, other: &Node) -> bool {
        same_shape(std::slice::from_ref(self), std::slice::from_ref(other))
    }
}

/// Compares two forests the way [`Node::same_shape`] compares two nodes.
pub fn same_shape(left: &[Node], right: &[Node]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut pending: Vec<(&Node, &Node)> = left.iter().zip(right).collect();

    while let Some(pair) = pending.pop() {
        match pair {
            (Node::Bookmark(a), Node::Bookmark(b)) => {
                if a.url != b.url || a.title != b.title {
                    return false;
                }
            }
            (Node::Folder(a), Node::Folder(b)) => {
                if a.title != b.title || a.children.len() != b.children.len() {
                    return false;
                }
                pending.extend(a.children.iter().zip(&b.children));
            }
            _ => return false,
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_placeholder_title() {
        assert_eq!(Folder::from_source(None, vec![]).title, "Folder");
        assert_eq!(Folder::from_source(Some(""), vec![]).title, "Folder");
        assert_eq!(Folder::from_source(Some("Work"), vec![]).title, "Work");
    }

    #[test]
    fn test_bookmark_title_falls_back_to_url_prefix() {
        let url = format!("https://example.com/{}", "a".repeat(80));
        let bookmark = Bookmark::from_source(&url, None);
        assert_eq!(bookmark.title.chars().count(), URL_TITLE_CHARS);
        assert!(url.starts_with(&bookmark.title));

        let short = Bookmark::from_source("https://x.io", Some(""));
        assert_eq!(short.title, "https://x.io");
    }

    #[test]
    fn test_bookmark_title_prefix_respects_char_boundaries() {
        let url = format!("https://例え.jp/{}", "日本語".repeat(30));
        let bookmark = Bookmark::from_source(&url, None);
        assert_eq!(bookmark.title.chars().count(), URL_TITLE_CHARS);
    }

    #[test]
    fn test_dropping_deep_tree_does_not_overflow() {
        let mut node = Node::bookmark("https://deep.example", "leaf");
        for _ in 0..100_000 {
            node = Node::folder("level", vec![node]);
        }
        drop(node);
    }

    #[test]
    fn test_uuids_are_unique_and_uppercase() {
        let a = new_uuid();
        let b = new_uuid();
        assert_ne!(a, b);
        assert_eq!(a, a.to_uppercase());
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn test_same_shape_ignores_uuids() {
        let a = Node::folder("A", vec![Node::bookmark("https://x.io", "X")]);
        let b = Node::folder("A", vec![Node::bookmark("https://x.io", "X")]);
        assert_ne!(a, b);
        assert!(a.same_shape(&b));

        let c = Node::folder("A", vec![Node::bookmark("https://y.io", "X")]);
        assert!(!a.same_shape(&c));

        let d = Node::folder("A", vec![Node::folder("X", vec![])]);
        assert!(!a.same_shape(&d));
    }
}
