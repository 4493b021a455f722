use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use ferrymark_core::config::{MigrationPaths, PlistFormat, Policies, find_places_database};
use ferrymark_core::pipeline::{
    ExportOptions, ExportSummary, MigrateOptions, RepairOptions, execute_analysis,
    execute_export, execute_inspect, execute_migration, execute_repair,
};
use ferrymark_core::report::{
    ReportFormat, RunSummary, generate_domain_json_report, generate_domain_text_report,
    generate_inspect_text_report, save_report,
};
use ferrymark_tree::{Anomalies, DomainStats, MissingUrlPolicy, TitleMatch};
use std::path::PathBuf;

// Argument helpers

/// Expand a leading `~` to the home directory
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Use `--source` when given, otherwise look for a profile under `profiles`
pub fn resolve_source(source: Option<&str>, profiles: &str) -> Result<PathBuf> {
    if let Some(source) = source {
        return Ok(expand_path(source));
    }
    let root = expand_path(profiles);
    find_places_database(&root)
        .ok_or_else(|| anyhow!("No places.sqlite found in any profile under {}", root.display()))
}

pub fn parse_missing_url(value: &str) -> Result<MissingUrlPolicy> {
    MissingUrlPolicy::from_str(value).ok_or_else(|| anyhow!("Unknown missing-url policy '{}'", value))
}

pub fn parse_title_match(value: &str) -> Result<TitleMatch> {
    TitleMatch::from_str(value).ok_or_else(|| anyhow!("Unknown title-match mode '{}'", value))
}

pub fn plist_format(binary: bool) -> PlistFormat {
    if binary {
        PlistFormat::Binary
    } else {
        PlistFormat::Xml
    }
}

fn string_arg<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("Missing --{}", name))
}

fn path_arg(args: &ArgMatches, name: &str) -> Result<PathBuf> {
    string_arg(args, name).map(expand_path)
}

fn title_match_policy(args: &ArgMatches) -> Result<Policies> {
    Ok(Policies {
        title_match: parse_title_match(string_arg(args, "title-match")?)?,
        ..Policies::default()
    })
}

// Output helpers

pub fn print_banner() {
    println!(
        "{} {}",
        "ferrymark".bright_cyan().bold(),
        env!("CARGO_PKG_VERSION").dimmed()
    );
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

/// One-line result of a migrate or repair run
pub fn summary_line(verb: &str, summary: &RunSummary) -> String {
    let mut line = format!("{} {} into {}", verb, summary.counts_line(), summary.target);
    if summary.folders_collapsed > 0 {
        line.push_str(&format!(" ({} folders collapsed)", summary.folders_collapsed));
    }
    if summary.dry_run {
        line.push_str(" [dry run, nothing written]");
    }
    line
}

fn print_run_summary(verb: &str, summary: &RunSummary) {
    println!("{} {}", "✓".green().bold(), summary_line(verb, summary));
    if let Some(before) = &summary.before {
        println!(
            "  {} {} bookmarks, {} folders before",
            "→".blue(),
            before.bookmarks,
            before.folders
        );
    }
    if let Some(backup) = &summary.backup {
        println!("  {} Backup: {}", "→".blue(), backup.bright_white());
    }
}

// Command handlers

pub fn handle_migrate(args: &ArgMatches) -> Result<RunSummary> {
    let source = resolve_source(
        args.get_one::<String>("source").map(String::as_str),
        string_arg(args, "profiles")?,
    )?;
    let options = MigrateOptions {
        paths: MigrationPaths::new(source, path_arg(args, "target")?, path_arg(args, "backup-dir")?),
        policies: Policies {
            missing_url: parse_missing_url(string_arg(args, "missing-url")?)?,
            ..Policies::default()
        },
        format: plist_format(args.get_flag("binary")),
        dry_run: args.get_flag("dry-run"),
    };

    let summary = execute_migration(&options).with_context(|| {
        format!("Migration from {} failed", options.paths.source.display())
    })?;
    print_run_summary(if summary.dry_run { "Would migrate" } else { "Migrated" }, &summary);
    Ok(summary)
}

pub fn handle_repair(args: &ArgMatches) -> Result<RunSummary> {
    let options = RepairOptions {
        target: path_arg(args, "target")?,
        backup_dir: path_arg(args, "backup-dir")?,
        policies: title_match_policy(args)?,
        format: plist_format(args.get_flag("binary")),
        dry_run: args.get_flag("dry-run"),
    };

    let summary = execute_repair(&options)
        .with_context(|| format!("Repair of {} failed", options.target.display()))?;
    print_run_summary(if summary.dry_run { "Would write" } else { "Wrote" }, &summary);
    Ok(summary)
}

/// Prints `report`, or saves it when an output path was given
fn emit_report(report: &str, output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            let path = expand_path(&path.to_string_lossy());
            save_report(report, &path)
                .with_context(|| format!("Saving report to {} failed", path.display()))?;
            println!("{} Report saved to {}", "✓".green().bold(), path.display());
        }
        None => print!("{}", report),
    }
    Ok(())
}

pub fn handle_analyze(args: &ArgMatches) -> Result<DomainStats> {
    let input = path_arg(args, "input")?;
    let top = args.get_one::<usize>("top").copied().unwrap_or(50);
    let format = ReportFormat::from_str(string_arg(args, "format")?).unwrap_or(ReportFormat::Text);

    let stats = execute_analysis(&input)
        .with_context(|| format!("Analysis of {} failed", input.display()))?;

    let report = match format {
        ReportFormat::Json => format!("{}\n", generate_domain_json_report(&stats, top)?),
        ReportFormat::Text => generate_domain_text_report(&stats, top),
    };
    emit_report(&report, args.get_one::<PathBuf>("output"))?;

    if matches!(format, ReportFormat::Text) {
        println!(
            "{} Analyzed {} bookmarks across {} domains",
            "✓".green().bold(),
            stats.total,
            stats.frequencies.len()
        );
    }
    Ok(stats)
}

pub fn handle_export(args: &ArgMatches) -> Result<ExportSummary> {
    let options = ExportOptions {
        input: path_arg(args, "target")?,
        output: path_arg(args, "output")?,
        dedupe: !args.get_flag("keep-duplicates"),
    };

    let summary = execute_export(&options)
        .with_context(|| format!("Export of {} failed", options.input.display()))?;
    println!(
        "{} Exported {} of {} bookmarks to {}",
        "✓".green().bold(),
        summary.written,
        summary.collected,
        options.output.display()
    );
    Ok(summary)
}

pub fn handle_inspect(args: &ArgMatches) -> Result<Anomalies> {
    let target = path_arg(args, "target")?;
    let policies = title_match_policy(args)?;

    let anomalies = execute_inspect(&target, &policies)
        .with_context(|| format!("Inspection of {} failed", target.display()))?;

    let report = generate_inspect_text_report(&anomalies);
    match args.get_one::<PathBuf>("output") {
        Some(path) => emit_report(&report, Some(path))?,
        None => {
            print_divider();
            print!("{}", report);
            print_divider();
        }
    }
    println!(
        "{} Inspected {} bookmarks, {} folders",
        "✓".green().bold(),
        anomalies.counts.bookmarks,
        anomalies.counts.folders
    );
    Ok(anomalies)
}
