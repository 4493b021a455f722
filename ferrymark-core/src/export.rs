// Flat `{url, title}` export consumed by the domain report

use crate::error::{CoreError, Result};
use crate::sink::write_atomic;
use ferrymark_tree::BookmarkRecord;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

pub fn load_records(path: &Path) -> Result<Vec<BookmarkRecord>> {
    if !path.is_file() {
        return Err(CoreError::SourceUnavailable(path.to_path_buf()));
    }
    let reader = BufReader::new(File::open(path)?);
    let records: Vec<BookmarkRecord> = serde_json::from_reader(reader)?;
    info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

pub fn write_records(path: &Path, records: &[BookmarkRecord]) -> Result<()> {
    let json = serde_json::to_vec_pretty(records)?;
    write_atomic(path, &json)
}
