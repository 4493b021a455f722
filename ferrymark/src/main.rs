use ferrymark::commands::command_argument_builder;
use ferrymark::handlers::{
    handle_analyze, handle_export, handle_inspect, handle_migrate, handle_repair, print_banner,
};
use tracing::Level;

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    init_tracing(chosen_command.get_flag("verbose"));

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    let result = match chosen_command.subcommand() {
        Some(("migrate", args)) => handle_migrate(args).map(|_| ()),
        Some(("repair", args)) => handle_repair(args).map(|_| ()),
        Some(("analyze", args)) => handle_analyze(args).map(|_| ()),
        Some(("export", args)) => handle_export(args).map(|_| ()),
        Some(("inspect", args)) => handle_inspect(args).map(|_| ()),
        // No subcommand provided, just show the banner
        None => Ok(()),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}
