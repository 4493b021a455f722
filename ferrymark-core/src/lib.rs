pub mod config;
pub mod data;
pub mod envelope;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod report;
pub mod sink;

pub use config::{MigrationPaths, PlistFormat, Policies, find_places_database};
pub use data::PlacesDatabase;
pub use envelope::Envelope;
pub use error::CoreError;
pub use pipeline::{
    ExportOptions, ExportSummary, MigrateOptions, RepairOptions, execute_analysis,
    execute_export, execute_inspect, execute_migration, execute_repair,
};
pub use report::{ReportFormat, RunSummary};
pub use sink::{Sink, backup_file, write_atomic};
