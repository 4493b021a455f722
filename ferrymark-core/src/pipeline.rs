use crate::config::{MigrationPaths, PlistFormat, Policies};
use crate::data::PlacesDatabase;
use crate::envelope::Envelope;
use crate::error::Result;
use crate::export::{load_records, write_records};
use crate::report::RunSummary;
use crate::sink::Sink;
use ferrymark_tree::{
    Anomalies, DomainStats, FlattenStats, Flattener, TreeBuilder, aggregate, collect_records,
    dedupe_records, inspect,
};
use std::path::{Path, PathBuf};
use tracing::info;

/// Options for a places database to property list migration
pub struct MigrateOptions {
    pub paths: MigrationPaths,
    pub policies: Policies,
    pub format: PlistFormat,
    pub dry_run: bool,
}

/// Options for flattening an existing property list in place
pub struct RepairOptions {
    pub target: PathBuf,
    pub backup_dir: PathBuf,
    pub policies: Policies,
    pub format: PlistFormat,
    pub dry_run: bool,
}

pub struct ExportOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub dedupe: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    pub collected: usize,
    pub written: usize,
}

fn path_string(path: &Path) -> String {
    path.display().to_string()
}

/// Rebuilds the source tree and writes it as the target document.
///
/// The target is backed up before it is replaced. With `dry_run` set the
/// document is still built and serialized, but nothing touches the disk.
pub fn execute_migration(options: &MigrateOptions) -> Result<RunSummary> {
    let MigrateOptions {
        paths,
        policies,
        format,
        dry_run,
    } = options;

    let database = PlacesDatabase::open(&paths.source)?;
    let rows = database.snapshot()?;
    let tree = TreeBuilder::new(&rows)
        .with_missing_url(policies.missing_url)
        .build()?;

    let envelope = Envelope::wrap(tree);
    let counts = envelope.counts();
    let bytes = envelope.to_bytes(*format)?;

    let backup = if *dry_run {
        info!("Dry run: skipping write of {}", paths.target.display());
        None
    } else {
        Sink::from_paths(paths).replace(&bytes)?
    };

    info!(
        "Migrated {} bookmarks and {} folders",
        counts.bookmarks, counts.folders
    );
    Ok(RunSummary {
        source: path_string(&paths.source),
        target: path_string(&paths.target),
        counts,
        before: None,
        folders_collapsed: 0,
        backup: backup.as_deref().map(path_string),
        dry_run: *dry_run,
    })
}

/// Collapses same-titled nested folders in every section of the target.
pub fn execute_repair(options: &RepairOptions) -> Result<RunSummary> {
    let envelope = Envelope::read(&options.target)?;
    let before = envelope.counts();

    let flattener = Flattener::new().with_title_match(options.policies.title_match);
    let mut stats = FlattenStats::default();
    let repaired = envelope.map_sections(|nodes| {
        let (flat, section) = flattener.flatten_with_stats(nodes);
        stats.folders_seen += section.folders_seen;
        stats.folders_collapsed += section.folders_collapsed;
        flat
    });
    let counts = repaired.counts();

    let backup = if options.dry_run {
        info!("Dry run: skipping write of {}", options.target.display());
        None
    } else {
        let bytes = repaired.to_bytes(options.format)?;
        Sink::new(options.target.clone(), options.backup_dir.clone()).replace(&bytes)?
    };

    info!(
        "Collapsed {} of {} folders",
        stats.folders_collapsed, stats.folders_seen
    );
    Ok(RunSummary {
        source: path_string(&options.target),
        target: path_string(&options.target),
        counts,
        before: Some(before),
        folders_collapsed: stats.folders_collapsed,
        backup: backup.as_deref().map(path_string),
        dry_run: options.dry_run,
    })
}

/// Flattens the target document into `{url, title}` records on disk.
pub fn execute_export(options: &ExportOptions) -> Result<ExportSummary> {
    let envelope = Envelope::read(&options.input)?;
    let records = collect_records(&envelope.into_top_level());
    let collected = records.len();

    let records = if options.dedupe {
        dedupe_records(records)
    } else {
        records
    };

    write_records(&options.output, &records)?;
    info!(
        "Exported {} of {} records to {}",
        records.len(),
        collected,
        options.output.display()
    );
    Ok(ExportSummary {
        collected,
        written: records.len(),
    })
}

pub fn execute_analysis(input: &Path) -> Result<DomainStats> {
    let records = load_records(input)?;
    Ok(aggregate(&records))
}

pub fn execute_inspect(target: &Path, policies: &Policies) -> Result<Anomalies> {
    let envelope = Envelope::read(target)?;
    Ok(inspect(&envelope.into_top_level(), policies.title_match))
}
