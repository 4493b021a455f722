// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

#[path = "commands.rs"]
pub mod commands;

pub use commands::{CLAP_STYLING, command_argument_builder};
pub use handlers::{
    expand_path, handle_analyze, handle_export, handle_inspect, handle_migrate, handle_repair,
    parse_missing_url, parse_title_match, plist_format, print_banner, resolve_source,
    summary_line,
};
