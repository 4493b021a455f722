use clap::{arg, command};
use ferrymark_core::config::{DEFAULT_BACKUP_DIR, DEFAULT_EXPORT, DEFAULT_PROFILES_DIR, DEFAULT_TARGET};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

fn target_arg() -> clap::Arg {
    arg!(-t --"target" <PATH>)
        .required(false)
        .help("Bookmarks property list")
        .default_value(DEFAULT_TARGET)
}

fn backup_dir_arg() -> clap::Arg {
    arg!(-b --"backup-dir" <DIR>)
        .required(false)
        .help("Directory receiving the timestamped backup of the target")
        .default_value(DEFAULT_BACKUP_DIR)
}

fn title_match_arg() -> clap::Arg {
    arg!(--"title-match" <MODE>)
        .required(false)
        .help("How nested folder titles are compared")
        .value_parser(["exact", "trimmed", "case-insensitive"])
        .default_value("exact")
}

fn binary_arg() -> clap::Arg {
    arg!(--"binary")
        .required(false)
        .help("Write a binary property list instead of XML")
        .action(clap::ArgAction::SetTrue)
}

fn dry_run_arg() -> clap::Arg {
    arg!(-n --"dry-run")
        .required(false)
        .help("Run the transformation and report counts without writing anything")
        .action(clap::ArgAction::SetTrue)
}

fn report_output_arg() -> clap::Arg {
    arg!(-o --"output" <PATH>)
        .required(false)
        .help("Save report to file (default: display to screen)")
        .value_parser(clap::value_parser!(std::path::PathBuf))
}

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("ferrymark")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("ferrymark")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Log debug detail to stderr")
                .required(false)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("migrate")
                .about("Rebuilds the places database bookmark tree as a Safari property list")
                .arg(
                    arg!(-s --"source" <PATH>)
                        .required(false)
                        .help("places.sqlite to read (default: discovered under --profiles)")
                        .conflicts_with("profiles"),
                )
                .arg(
                    arg!(-p --"profiles" <DIR>)
                        .required(false)
                        .help("Browser profiles directory searched for places.sqlite")
                        .default_value(DEFAULT_PROFILES_DIR),
                )
                .arg(target_arg())
                .arg(backup_dir_arg())
                .arg(
                    arg!(--"missing-url" <POLICY>)
                        .required(false)
                        .help("What to do with bookmark rows that have no URL")
                        .value_parser(["drop", "fail"])
                        .default_value("drop"),
                )
                .arg(binary_arg())
                .arg(dry_run_arg()),
        )
        .subcommand(
            command!("repair")
                .about("Collapses folders nested inside a folder with the same title")
                .arg(target_arg())
                .arg(backup_dir_arg())
                .arg(title_match_arg())
                .arg(binary_arg())
                .arg(dry_run_arg()),
        )
        .subcommand(
            command!("analyze")
                .about("Reports bookmark counts per domain and per static hosting platform")
                .arg(
                    arg!(-i --"input" <PATH>)
                        .required(false)
                        .help("Flat JSON export produced by the export command")
                        .default_value(DEFAULT_EXPORT),
                )
                .arg(
                    arg!(--"top" <N>)
                        .required(false)
                        .help("Number of domains to list")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("50"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(report_output_arg()),
        )
        .subcommand(
            command!("export")
                .about("Writes every bookmark of the property list as flat {url, title} JSON")
                .arg(target_arg())
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("JSON file to write")
                        .default_value(DEFAULT_EXPORT),
                )
                .arg(
                    arg!(--"keep-duplicates")
                        .required(false)
                        .help("Keep every copy of a URL instead of the first one only")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("inspect")
                .about("Reports duplicates, empty folders and redundant nesting without changing anything")
                .arg(target_arg())
                .arg(title_match_arg())
                .arg(report_output_arg()),
        )
}
