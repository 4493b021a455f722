use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Row source error: {0}")]
    Source(String),

    #[error("No root row found (expected one row with parent 0 or NULL)")]
    MissingRoot,

    #[error("Ambiguous root: {0} rows have parent 0 or NULL")]
    AmbiguousRoot(usize),

    #[error("Bookmark row {0} has no URL")]
    MissingUrl(i64),

    #[error("Folder row {0} is its own ancestor")]
    Cycle(i64),
}

pub type Result<T> = std::result::Result<T, TreeError>;
