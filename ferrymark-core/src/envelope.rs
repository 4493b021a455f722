// Property list envelope: the nested document the target application reads

use crate::config::PlistFormat;
use crate::error::{CoreError, Result};
use ferrymark_tree::{Bookmark, Counts, Folder, Node, count, new_uuid};
use plist::{Dictionary, Value};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, warn};

pub const FILE_VERSION: i64 = 1;

pub const KEY_FILE_VERSION: &str = "WebBookmarkFileVersion";
pub const KEY_TYPE: &str = "WebBookmarkType";
pub const KEY_UUID: &str = "WebBookmarkUUID";
pub const KEY_TITLE: &str = "Title";
pub const KEY_CHILDREN: &str = "Children";
pub const KEY_URL: &str = "URLString";
pub const KEY_URI_DICTIONARY: &str = "URIDictionary";
pub const KEY_URI_TITLE: &str = "title";

pub const TYPE_LIST: &str = "WebBookmarkTypeList";
pub const TYPE_LEAF: &str = "WebBookmarkTypeLeaf";

pub const BAR_TITLE: &str = "BookmarksBar";
pub const MENU_TITLE: &str = "BookmarksMenu";

const ROOT_KEYS: [&str; 4] = [KEY_FILE_VERSION, KEY_TYPE, KEY_UUID, KEY_CHILDREN];

/// The root container with its named top-level sections.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub file_version: i64,
    /// Primary section; migrated trees land here.
    pub bar: Vec<Node>,
    /// Secondary section; empty after a migration.
    pub menu: Vec<Node>,
    /// Any other top-level child (reading list, history proxy), written
    /// back untouched after the two sections.
    pub extra: Vec<Value>,
    /// Root keys this module does not write itself, such as sync state.
    pub attributes: Dictionary,
}

impl Default for Envelope {
    fn default() -> Self {
        Self::wrap(Vec::new())
    }
}

impl Envelope {
    /// Places `tree` under the primary section and leaves the menu empty.
    pub fn wrap(tree: Vec<Node>) -> Self {
        Envelope {
            file_version: FILE_VERSION,
            bar: tree,
            menu: Vec::new(),
            extra: Vec::new(),
            attributes: Dictionary::new(),
        }
    }

    /// Counts over the two bookmark sections, synthetic containers excluded.
    pub fn counts(&self) -> Counts {
        let bar = count(&self.bar);
        let menu = count(&self.menu);
        Counts {
            bookmarks: bar.bookmarks + menu.bookmarks,
            folders: bar.folders + menu.folders,
        }
    }

    /// Section contents in document order. Consumes the envelope so deep
    /// trees are moved, not copied.
    pub fn into_top_level(self) -> Vec<Node> {
        let Envelope {
            mut bar, menu, extra, ..
        } = self;
        bar.extend(menu);
        release_all(extra);
        bar
    }

    /// Applies `f` to each bookmark section in turn.
    pub fn map_sections(self, mut f: impl FnMut(&[Node]) -> Vec<Node>) -> Self {
        Envelope {
            bar: f(&self.bar),
            menu: f(&self.menu),
            ..self
        }
    }

    /// Serializes into a property list value. Every modeled node, the
    /// synthetic root and sections included, gets a fresh identifier.
    pub fn to_value(&self) -> Value {
        let mut sections = vec![
            list_value(BAR_TITLE, forest_values(&self.bar)),
            list_value(MENU_TITLE, forest_values(&self.menu)),
        ];
        sections.extend(self.extra.iter().cloned());

        let mut root = self.attributes.clone();
        root.insert(
            KEY_FILE_VERSION.to_string(),
            Value::Integer(self.file_version.into()),
        );
        root.insert(KEY_TYPE.to_string(), Value::String(TYPE_LIST.to_string()));
        root.insert(KEY_UUID.to_string(), Value::String(new_uuid()));
        root.insert(KEY_CHILDREN.to_string(), Value::Array(sections));
        Value::Dictionary(root)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let root = value
            .as_dictionary()
            .ok_or_else(|| CoreError::MalformedDocument("root is not a dictionary".into()))?;

        let file_version = root
            .get(KEY_FILE_VERSION)
            .and_then(Value::as_signed_integer)
            .unwrap_or(FILE_VERSION);

        let mut envelope = Envelope {
            file_version,
            ..Envelope::default()
        };
        for (key, value) in root {
            if !ROOT_KEYS.contains(&key.as_str()) {
                envelope.attributes.insert(key.clone(), value.clone());
            }
        }

        let (mut seen_bar, mut seen_menu) = (false, false);
        for child in children_of(root)? {
            match section_title(child) {
                Some(BAR_TITLE) if !seen_bar => {
                    seen_bar = true;
                    envelope.bar = parse_section(child)?;
                }
                Some(MENU_TITLE) if !seen_menu => {
                    seen_menu = true;
                    envelope.menu = parse_section(child)?;
                }
                _ => envelope.extra.push(child.clone()),
            }
        }

        debug!(
            "Parsed envelope: {} bar, {} menu, {} extra top-level entries",
            envelope.bar.len(),
            envelope.menu.len(),
            envelope.extra.len()
        );
        Ok(envelope)
    }

    pub fn to_bytes(&self, format: PlistFormat) -> Result<Vec<u8>> {
        let value = self.to_value();
        let mut buffer = Vec::new();
        let written = match format {
            PlistFormat::Xml => value.to_writer_xml(&mut buffer),
            PlistFormat::Binary => value.to_writer_binary(&mut buffer),
        };
        release(value);
        written?;
        Ok(buffer)
    }

    /// Parses XML or binary property list bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let value = Value::from_reader(Cursor::new(bytes))?;
        let envelope = Self::from_value(&value);
        release(value);
        envelope
    }

    pub fn read(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(CoreError::SourceUnavailable(path.to_path_buf()));
        }
        let value = Value::from_file(path)?;
        let envelope = Self::from_value(&value);
        release(value);
        envelope
    }
}

/// Drops a property list value without recursing into nested containers.
fn release(value: Value) {
    release_all(vec![value]);
}

fn release_all(mut pending: Vec<Value>) {
    while let Some(value) = pending.pop() {
        match value {
            Value::Array(items) => pending.extend(items),
            Value::Dictionary(dict) => pending.extend(dict.into_iter().map(|(_, v)| v)),
            _ => {}
        }
    }
}

fn list_value(title: &str, children: Vec<Value>) -> Value {
    let mut dict = Dictionary::new();
    dict.insert(KEY_TYPE.to_string(), Value::String(TYPE_LIST.to_string()));
    dict.insert(KEY_TITLE.to_string(), Value::String(title.to_string()));
    dict.insert(KEY_UUID.to_string(), Value::String(new_uuid()));
    dict.insert(KEY_CHILDREN.to_string(), Value::Array(children));
    Value::Dictionary(dict)
}

fn leaf_value(bookmark: &Bookmark) -> Value {
    let mut uri = Dictionary::new();
    uri.insert(KEY_URI_TITLE.to_string(), Value::String(bookmark.title.clone()));

    let mut dict = Dictionary::new();
    dict.insert(KEY_TYPE.to_string(), Value::String(TYPE_LEAF.to_string()));
    dict.insert(KEY_URL.to_string(), Value::String(bookmark.url.clone()));
    dict.insert(KEY_URI_DICTIONARY.to_string(), Value::Dictionary(uri));
    dict.insert(KEY_UUID.to_string(), Value::String(new_uuid()));
    Value::Dictionary(dict)
}

/// Serializes a forest bottom-up with an explicit stack of open folders.
fn forest_values(nodes: &[Node]) -> Vec<Value> {
    struct Frame<'a> {
        title: &'a str,
        pending: std::slice::Iter<'a, Node>,
        built: Vec<Value>,
    }

    let mut stack = vec![Frame {
        title: "",
        pending: nodes.iter(),
        built: Vec::with_capacity(nodes.len()),
    }];

    loop {
        let Some(frame) = stack.last_mut() else {
            return Vec::new();
        };
        match frame.pending.next() {
            Some(Node::Bookmark(bookmark)) => frame.built.push(leaf_value(bookmark)),
            Some(Node::Folder(folder)) => stack.push(Frame {
                title: &folder.title,
                pending: folder.children.iter(),
                built: Vec::with_capacity(folder.children.len()),
            }),
            None => {
                let Some(done) = stack.pop() else {
                    return Vec::new();
                };
                match stack.last_mut() {
                    Some(outer) => outer.built.push(list_value(done.title, done.built)),
                    None => return done.built,
                }
            }
        }
    }
}

fn children_of(dict: &Dictionary) -> Result<&[Value]> {
    match dict.get(KEY_CHILDREN) {
        None => Ok(&[]),
        Some(value) => value
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| CoreError::MalformedDocument(format!("{} is not an array", KEY_CHILDREN))),
    }
}

fn section_title(value: &Value) -> Option<&str> {
    let dict = value.as_dictionary()?;
    let kind = dict.get(KEY_TYPE).and_then(Value::as_string);
    if kind.is_some_and(|k| k != TYPE_LIST) {
        return None;
    }
    dict.get(KEY_TITLE).and_then(Value::as_string)
}

/// One decoded entry; folders hand back their raw children for the caller
/// to descend into.
enum Entry<'a> {
    Leaf(Bookmark),
    Folder {
        title: String,
        uuid: String,
        children: &'a [Value],
    },
    Skipped,
}

fn parse_section(value: &Value) -> Result<Vec<Node>> {
    match value.as_dictionary() {
        Some(dict) => parse_forest(children_of(dict)?),
        None => Ok(Vec::new()),
    }
}

/// Rebuilds nodes from raw children with an explicit stack of open folders.
fn parse_forest(values: &[Value]) -> Result<Vec<Node>> {
    struct Frame<'a> {
        folder: Option<(String, String)>,
        pending: std::slice::Iter<'a, Value>,
        built: Vec<Node>,
    }

    let mut stack = vec![Frame {
        folder: None,
        pending: values.iter(),
        built: Vec::new(),
    }];

    loop {
        let Some(frame) = stack.last_mut() else {
            return Ok(Vec::new());
        };
        let Some(value) = frame.pending.next() else {
            let Some(done) = stack.pop() else {
                return Ok(Vec::new());
            };
            match (done.folder, stack.last_mut()) {
                (Some((title, uuid)), Some(outer)) => outer.built.push(Node::Folder(Folder {
                    title,
                    uuid,
                    children: done.built,
                })),
                _ => return Ok(done.built),
            }
            continue;
        };
        match parse_entry(value)? {
            Entry::Leaf(bookmark) => frame.built.push(Node::Bookmark(bookmark)),
            Entry::Folder {
                title,
                uuid,
                children,
            } => stack.push(Frame {
                folder: Some((title, uuid)),
                pending: children.iter(),
                built: Vec::new(),
            }),
            Entry::Skipped => {}
        }
    }
}

fn parse_entry(value: &Value) -> Result<Entry<'_>> {
    let Some(dict) = value.as_dictionary() else {
        warn!("Skipping non-dictionary bookmark entry");
        return Ok(Entry::Skipped);
    };
    let uuid = dict
        .get(KEY_UUID)
        .and_then(Value::as_string)
        .map(String::from)
        .unwrap_or_else(new_uuid);

    match dict.get(KEY_TYPE).and_then(Value::as_string) {
        Some(TYPE_LEAF) => {
            let Some(url) = dict
                .get(KEY_URL)
                .and_then(Value::as_string)
                .filter(|u| !u.is_empty())
            else {
                warn!("Skipping leaf {} without {}", uuid, KEY_URL);
                return Ok(Entry::Skipped);
            };
            // Stored titles are kept verbatim, empty ones included
            let title = dict
                .get(KEY_URI_DICTIONARY)
                .and_then(Value::as_dictionary)
                .and_then(|uri| uri.get(KEY_URI_TITLE))
                .and_then(Value::as_string)
                .unwrap_or_default();
            Ok(Entry::Leaf(Bookmark {
                url: url.to_string(),
                title: title.to_string(),
                uuid,
            }))
        }
        Some(TYPE_LIST) => folder_entry(dict, uuid),
        None if dict.contains_key(KEY_CHILDREN) => folder_entry(dict, uuid),
        other => {
            warn!("Skipping entry {} of unsupported type {:?}", uuid, other);
            Ok(Entry::Skipped)
        }
    }
}

fn folder_entry(dict: &Dictionary, uuid: String) -> Result<Entry<'_>> {
    let title = dict
        .get(KEY_TITLE)
        .and_then(Value::as_string)
        .unwrap_or_default()
        .to_string();
    Ok(Entry::Folder {
        title,
        uuid,
        children: children_of(dict)?,
    })
}
