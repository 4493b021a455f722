use crate::error::{CoreError, Result};
use ferrymark_tree::{Row, RowIndex, RowKind, RowSource, TreeError};
use rusqlite::{Connection, OpenFlags, params};
use std::path::Path;
use tracing::{debug, info};

/// Read-only view over a places database (`moz_bookmarks` joined with
/// `moz_places`).
pub struct PlacesDatabase {
    conn: Connection,
}

fn source_error(e: rusqlite::Error) -> TreeError {
    TreeError::Source(e.to_string())
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Row> {
    Ok(Row {
        id: row.get(0)?,
        kind: RowKind::from_code(row.get::<_, Option<i64>>(1)?.unwrap_or(0)),
        title: row.get(2)?,
        url: row.get(3)?,
    })
}

impl PlacesDatabase {
    pub fn exists(path: &Path) -> bool {
        path.is_file()
    }

    /// Opens the database read-only. A missing file is reported as
    /// [`CoreError::SourceUnavailable`] instead of being created.
    pub fn open(path: &Path) -> Result<Self> {
        if !Self::exists(path) {
            return Err(CoreError::SourceUnavailable(path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        debug!("Opened places database {}", path.display());
        Ok(PlacesDatabase { conn })
    }

    /// Loads every bookmark row in one query into a parent -> children index.
    pub fn snapshot(&self) -> Result<RowIndex> {
        let mut stmt = self.conn.prepare(
            "SELECT b.id, b.type, b.title, p.url, b.parent, b.position
             FROM moz_bookmarks b
             LEFT JOIN moz_places p ON b.fk = p.id
             ORDER BY b.parent, b.position, b.id",
        )?;

        let rows = stmt.query_map([], |row| {
            let parent: Option<i64> = row.get(4)?;
            let position: Option<i64> = row.get(5)?;
            Ok((parent, position.unwrap_or(0), read_row(row)?))
        })?;

        let mut index = RowIndex::new();
        for row in rows {
            let (parent, position, row) = row?;
            index.insert(parent, position, row);
        }

        info!("Loaded {} bookmark rows", index.len());
        Ok(index)
    }
}

impl RowSource for PlacesDatabase {
    fn root_candidates(&self) -> ferrymark_tree::error::Result<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM moz_bookmarks WHERE parent = 0 OR parent IS NULL ORDER BY id")
            .map_err(source_error)?;

        stmt.query_map([], |row| row.get(0))
            .map_err(source_error)?
            .collect::<rusqlite::Result<Vec<i64>>>()
            .map_err(source_error)
    }

    fn children(&self, parent: i64) -> ferrymark_tree::error::Result<Vec<Row>> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT b.id, b.type, b.title, p.url
                 FROM moz_bookmarks b
                 LEFT JOIN moz_places p ON b.fk = p.id
                 WHERE b.parent = ?1
                 ORDER BY b.position, b.id",
            )
            .map_err(source_error)?;

        stmt.query_map(params![parent], read_row)
            .map_err(source_error)?
            .collect::<rusqlite::Result<Vec<Row>>>()
            .map_err(source_error)
    }
}
