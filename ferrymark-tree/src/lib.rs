pub mod builder;
pub mod count;
pub mod domains;
pub mod error;
pub mod flatten;
pub mod inspect;
pub mod node;
pub mod records;

pub use builder::{MissingUrlPolicy, ROOT_PARENT, Row, RowIndex, RowKind, RowSource, TreeBuilder};
pub use count::{Counts, count};
pub use domains::{DomainStats, HOSTING_SUFFIXES, UNKNOWN_DOMAIN, aggregate, extract_domain};
pub use error::TreeError;
pub use flatten::{FlattenStats, Flattener, TitleMatch};
pub use inspect::{Anomalies, inspect};
pub use node::{Bookmark, BookmarkRecord, Folder, Node, new_uuid, same_shape};
pub use records::{collect_records, dedupe_records, normalize_url};
