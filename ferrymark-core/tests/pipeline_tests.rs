// Tests for the end-to-end migrate, repair, export, analyze and inspect runs

use ferrymark_core::config::{MigrationPaths, PlistFormat, Policies};
use ferrymark_core::envelope::Envelope;
use ferrymark_core::error::CoreError;
use ferrymark_core::export::{load_records, write_records};
use ferrymark_core::pipeline::{
    ExportOptions, MigrateOptions, RepairOptions, execute_analysis, execute_export,
    execute_inspect, execute_migration, execute_repair,
};
use ferrymark_tree::{BookmarkRecord, MissingUrlPolicy, Node, TitleMatch, TreeError};
use plist::{Dictionary, Value};
use rusqlite::{Connection, params};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn create_places_db(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE moz_places (id INTEGER PRIMARY KEY, url TEXT);
         CREATE TABLE moz_bookmarks (
             id INTEGER PRIMARY KEY,
             type INTEGER,
             fk INTEGER,
             parent INTEGER,
             position INTEGER,
             title TEXT
         );
         INSERT INTO moz_places (id, url) VALUES
             (1, 'https://www.rust-lang.org/'),
             (2, 'https://docs.rs/'),
             (3, 'https://someone.github.io/blog');",
    )
    .unwrap();

    let rows: [(i64, i64, Option<i64>, i64, i64, Option<&str>); 6] = [
        (1, 2, None, 0, 0, Some("root")),
        (2, 2, None, 1, 0, Some("Dev")),
        (3, 1, Some(1), 2, 0, Some("Rust")),
        (4, 1, Some(2), 2, 1, None),
        (5, 1, Some(3), 1, 1, Some("Blog")),
        (6, 1, Some(99), 1, 2, Some("dangling")),
    ];
    for (id, kind, fk, parent, position, title) in rows {
        conn.execute(
            "INSERT INTO moz_bookmarks (id, type, fk, parent, position, title)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, kind, fk, parent, position, title],
        )
        .unwrap();
    }
}

fn create_deep_places_db(path: &Path, depth: i64) {
    let mut conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE moz_places (id INTEGER PRIMARY KEY, url TEXT);
         CREATE TABLE moz_bookmarks (
             id INTEGER PRIMARY KEY,
             type INTEGER,
             fk INTEGER,
             parent INTEGER,
             position INTEGER,
             title TEXT
         );
         INSERT INTO moz_places (id, url) VALUES (1, 'https://deep.example/');",
    )
    .unwrap();

    let tx = conn.transaction().unwrap();
    {
        let mut insert = tx
            .prepare(
                "INSERT INTO moz_bookmarks (id, type, fk, parent, position, title)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5)",
            )
            .unwrap();
        insert.execute(params![1, 2, None::<i64>, 0, "root"]).unwrap();
        for id in 2..depth {
            insert.execute(params![id, 2, None::<i64>, id - 1, "level"]).unwrap();
        }
        insert.execute(params![depth, 1, 1, depth - 1, "leaf"]).unwrap();
    }
    tx.commit().unwrap();
}

struct Fixture {
    _temp_dir: TempDir,
    paths: MigrationPaths,
}

fn fixture() -> Fixture {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("places.sqlite");
    create_places_db(&source);
    let paths = MigrationPaths::new(
        source,
        temp_dir.path().join("Safari").join("Bookmarks.plist"),
        temp_dir.path().join("backups"),
    );
    Fixture {
        _temp_dir: temp_dir,
        paths,
    }
}

fn migrate_options(paths: &MigrationPaths) -> MigrateOptions {
    MigrateOptions {
        paths: paths.clone(),
        policies: Policies::default(),
        format: PlistFormat::Xml,
        dry_run: false,
    }
}

fn repair_options(target: &Path, backup_dir: &Path) -> RepairOptions {
    RepairOptions {
        target: target.to_path_buf(),
        backup_dir: backup_dir.to_path_buf(),
        policies: Policies::default(),
        format: PlistFormat::Xml,
        dry_run: false,
    }
}

fn write_envelope(path: &Path, tree: Vec<Node>) {
    let bytes = Envelope::wrap(tree).to_bytes(PlistFormat::Xml).unwrap();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

fn backups_in(dir: &Path) -> Vec<PathBuf> {
    match fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

// ============================================================================
// Migration Tests
// ============================================================================

#[test]
fn test_migration_writes_target() {
    let fixture = fixture();
    let summary = execute_migration(&migrate_options(&fixture.paths)).unwrap();

    assert_eq!(summary.counts.bookmarks, 3);
    assert_eq!(summary.counts.folders, 1);
    assert!(summary.backup.is_none());
    assert!(!summary.dry_run);

    let envelope = Envelope::read(&fixture.paths.target).unwrap();
    assert_eq!(envelope.counts(), summary.counts);
    assert!(envelope.menu.is_empty());
    assert_eq!(envelope.bar[0].title(), "Dev");
    assert_eq!(envelope.bar[0].children()[1].title(), "https://docs.rs/");
    assert_eq!(envelope.bar[1].title(), "Blog");
}

#[test]
fn test_migration_backs_up_existing_target() {
    let fixture = fixture();
    write_envelope(&fixture.paths.target, vec![Node::bookmark("https://old.example", "Old")]);
    let original = fs::read(&fixture.paths.target).unwrap();

    let summary = execute_migration(&migrate_options(&fixture.paths)).unwrap();

    let backup = PathBuf::from(summary.backup.unwrap());
    assert_eq!(fs::read(&backup).unwrap(), original);
    assert_eq!(backups_in(&fixture.paths.backup_dir), vec![backup]);
}

#[test]
fn test_migration_dry_run_writes_nothing() {
    let fixture = fixture();
    let mut options = migrate_options(&fixture.paths);
    options.dry_run = true;

    let summary = execute_migration(&options).unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.counts.bookmarks, 3);
    assert!(!fixture.paths.target.exists());
    assert!(backups_in(&fixture.paths.backup_dir).is_empty());
}

#[test]
fn test_migration_binary_format() {
    let fixture = fixture();
    let mut options = migrate_options(&fixture.paths);
    options.format = PlistFormat::Binary;

    execute_migration(&options).unwrap();

    let bytes = fs::read(&fixture.paths.target).unwrap();
    assert!(bytes.starts_with(b"bplist00"));
    assert_eq!(Envelope::read(&fixture.paths.target).unwrap().counts().bookmarks, 3);
}

#[test]
fn test_migration_of_deeply_nested_tree() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("places.sqlite");
    let depth = 20_000;
    create_deep_places_db(&source, depth);
    let paths = MigrationPaths::new(
        source,
        temp_dir.path().join("Bookmarks.plist"),
        temp_dir.path().join("backups"),
    );
    let mut options = migrate_options(&paths);
    options.format = PlistFormat::Binary;

    options.dry_run = true;
    let summary = execute_migration(&options).unwrap();
    assert_eq!(summary.counts.bookmarks, 1);
    assert_eq!(summary.counts.folders, (depth - 2) as usize);
    assert!(!paths.target.exists());

    options.dry_run = false;
    execute_migration(&options).unwrap();
    let envelope = Envelope::read(&paths.target).unwrap();
    assert_eq!(envelope.counts(), summary.counts);
}

#[test]
fn test_migration_missing_source() {
    let fixture = fixture();
    let mut paths = fixture.paths.clone();
    paths.source = paths.source.with_file_name("absent.sqlite");

    let result = execute_migration(&migrate_options(&paths));
    assert!(matches!(result, Err(CoreError::SourceUnavailable(_))));
    assert!(!paths.target.exists());
}

#[test]
fn test_migration_fail_policy_leaves_target_untouched() {
    let fixture = fixture();
    write_envelope(&fixture.paths.target, vec![Node::bookmark("https://old.example", "Old")]);
    let original = fs::read(&fixture.paths.target).unwrap();

    let mut options = migrate_options(&fixture.paths);
    options.policies.missing_url = MissingUrlPolicy::Fail;

    let result = execute_migration(&options);
    assert!(matches!(
        result,
        Err(CoreError::Tree(TreeError::MissingUrl(6)))
    ));
    assert_eq!(fs::read(&fixture.paths.target).unwrap(), original);
    assert!(backups_in(&fixture.paths.backup_dir).is_empty());
}

// ============================================================================
// Repair Tests
// ============================================================================

fn nested_tree() -> Vec<Node> {
    vec![Node::folder(
        "Research",
        vec![Node::folder(
            "Research",
            vec![Node::folder(
                "Research",
                vec![Node::bookmark("https://paper.example", "Paper")],
            )],
        )],
    )]
}

#[test]
fn test_repair_collapses_nested_folders() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("Bookmarks.plist");
    write_envelope(&target, nested_tree());

    let summary = execute_repair(&repair_options(&target, temp_dir.path())).unwrap();

    assert_eq!(summary.folders_collapsed, 2);
    assert_eq!(summary.before.unwrap().folders, 3);
    assert_eq!(summary.counts.folders, 1);
    assert_eq!(summary.counts.bookmarks, 1);
    assert!(summary.backup.is_some());

    let envelope = Envelope::read(&target).unwrap();
    assert_eq!(envelope.bar.len(), 1);
    assert_eq!(envelope.bar[0].children().len(), 1);
    assert_eq!(envelope.bar[0].children()[0].title(), "Paper");
}

#[test]
fn test_repair_stats_sum_over_sections() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("Bookmarks.plist");
    let nested = |title: &str| {
        vec![Node::folder(
            title,
            vec![Node::folder(title, vec![Node::bookmark("https://s.example", "S")])],
        )]
    };
    let mut envelope = Envelope::wrap(nested("Bar"));
    envelope.menu = nested("Menu");
    fs::write(&target, envelope.to_bytes(PlistFormat::Xml).unwrap()).unwrap();

    let mut options = repair_options(&target, temp_dir.path());
    options.dry_run = true;
    let summary = execute_repair(&options).unwrap();

    assert_eq!(summary.folders_collapsed, 2);
    assert_eq!(summary.before.unwrap().folders, 4);
    assert_eq!(summary.counts.folders, 2);
}

#[test]
fn test_repair_title_match_policy() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("Bookmarks.plist");
    write_envelope(
        &target,
        vec![Node::folder(
            "News",
            vec![Node::folder("news ", vec![Node::bookmark("https://n.example", "N")])],
        )],
    );

    let exact = execute_repair(&RepairOptions {
        dry_run: true,
        ..repair_options(&target, temp_dir.path())
    })
    .unwrap();
    assert_eq!(exact.folders_collapsed, 0);

    let mut options = repair_options(&target, temp_dir.path());
    options.dry_run = true;
    options.policies.title_match = TitleMatch::CaseInsensitive;
    let relaxed = execute_repair(&options).unwrap();
    assert_eq!(relaxed.folders_collapsed, 1);
}

#[test]
fn test_repair_dry_run_leaves_file() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("Bookmarks.plist");
    let backups = temp_dir.path().join("backups");
    write_envelope(&target, nested_tree());
    let original = fs::read(&target).unwrap();

    let mut options = repair_options(&target, &backups);
    options.dry_run = true;
    let summary = execute_repair(&options).unwrap();

    assert_eq!(summary.folders_collapsed, 2);
    assert_eq!(fs::read(&target).unwrap(), original);
    assert!(backups_in(&backups).is_empty());
}

#[test]
fn test_repair_keeps_titles_and_unmodeled_entries() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("Bookmarks.plist");
    let mut history = Dictionary::new();
    history.insert("WebBookmarkType".to_string(), Value::String("WebBookmarkTypeProxy".to_string()));
    history.insert("Title".to_string(), Value::String("History".to_string()));
    let history = Value::Dictionary(history);

    let mut envelope = Envelope::wrap(vec![
        Node::bookmark("https://untitled.example/", ""),
        Node::bookmark("https://titled.example/", "Titled"),
    ]);
    envelope.extra.push(history.clone());
    fs::write(&target, envelope.to_bytes(PlistFormat::Xml).unwrap()).unwrap();

    let summary = execute_repair(&repair_options(&target, temp_dir.path())).unwrap();
    assert_eq!(summary.folders_collapsed, 0);

    let repaired = Envelope::read(&target).unwrap();
    assert_eq!(repaired.bar[0].title(), "");
    assert_eq!(repaired.bar[1].title(), "Titled");
    assert_eq!(repaired.extra, vec![history]);
}

#[test]
fn test_repair_missing_target() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("Bookmarks.plist");
    let result = execute_repair(&repair_options(&target, temp_dir.path()));
    assert!(matches!(result, Err(CoreError::SourceUnavailable(_))));
}

// ============================================================================
// Export, Analysis and Inspection Tests
// ============================================================================

#[test]
fn test_export_dedupes_by_normalized_url() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("Bookmarks.plist");
    let output = temp_dir.path().join("export").join("unique_bookmarks.json");
    write_envelope(
        &input,
        vec![
            Node::bookmark("https://a.example/", "First"),
            Node::folder("Dup", vec![Node::bookmark("HTTPS://A.EXAMPLE#top", "Second")]),
            Node::bookmark("https://b.example", "B"),
        ],
    );

    let summary = execute_export(&ExportOptions {
        input: input.clone(),
        output: output.clone(),
        dedupe: true,
    })
    .unwrap();
    assert_eq!(summary.collected, 3);
    assert_eq!(summary.written, 2);

    let records = load_records(&output).unwrap();
    assert_eq!(records[0].title, "First");
    assert_eq!(records[1].title, "B");

    let kept = execute_export(&ExportOptions {
        input,
        output,
        dedupe: false,
    })
    .unwrap();
    assert_eq!(kept.written, 3);
}

#[test]
fn test_analysis_of_records() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("records.json");
    let records: Vec<BookmarkRecord> = [
        "https://www.github.com/a",
        "https://github.com/b",
        "https://me.github.io",
        "not a url",
    ]
    .iter()
    .map(|url| BookmarkRecord {
        url: url.to_string(),
        title: String::new(),
    })
    .collect();
    write_records(&input, &records).unwrap();

    let stats = execute_analysis(&input).unwrap();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.top(1)[0], ("github.com".to_string(), 2));
    assert_eq!(stats.count_for("unknown"), 1);
    assert_eq!(stats.hosting_for("github.io"), 1);
}

#[test]
fn test_analysis_missing_input() {
    let temp_dir = TempDir::new().unwrap();
    let result = execute_analysis(&temp_dir.path().join("nope.json"));
    assert!(matches!(result, Err(CoreError::SourceUnavailable(_))));
}

#[test]
fn test_inspect_reports_anomalies() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("Bookmarks.plist");
    let mut tree = nested_tree();
    tree.push(Node::folder("Empty", vec![]));
    tree.push(Node::bookmark("https://paper.example/", "Paper again"));
    write_envelope(&target, tree);

    let anomalies = execute_inspect(&target, &Policies::default()).unwrap();
    assert_eq!(anomalies.nested_same_title, 2);
    assert_eq!(anomalies.empty_folders, 1);
    assert_eq!(anomalies.duplicate_urls, 1);
    assert_eq!(anomalies.counts.bookmarks, 2);
}
