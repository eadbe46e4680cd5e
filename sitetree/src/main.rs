use clap::ArgMatches;
use colored::Colorize;
use commands::command_argument_builder;
use sitetree::handlers::*;
use tracing::Level;

mod commands;

fn log_level(matches: &ArgMatches) -> Level {
    if matches.get_flag("quiet") {
        return Level::ERROR;
    }
    match matches.get_count("verbose") {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let db = matches
        .get_one::<String>("db")
        .map(String::as_str)
        .unwrap_or("~/.config/sitetree/sitetree.db");
    let ctx = CliContext {
        db_path: resolve_path(db),
        quiet: matches.get_flag("quiet"),
    };

    match matches.subcommand() {
        Some(("init", primary_command)) => handle_init(primary_command, &ctx),
        Some(("section", primary_command)) => match primary_command.subcommand() {
            Some(("add", secondary_command)) => handle_section_add(secondary_command, &ctx),
            Some(("list", _)) => handle_section_list(&ctx),
            _ => unreachable!("clap should ensure we don't get here"),
        },
        Some(("entry", primary_command)) => match primary_command.subcommand() {
            Some(("add", secondary_command)) => handle_entry_add(secondary_command, &ctx),
            Some(("list", secondary_command)) => handle_entry_list(secondary_command, &ctx),
            _ => unreachable!("clap should ensure we don't get here"),
        },
        Some(("fields", _)) => handle_fields(),
        Some(("inspect", primary_command)) => handle_inspect(primary_command, &ctx),
        Some(("preview", primary_command)) => handle_preview(primary_command, &ctx),
        Some(("import", primary_command)) => handle_import(primary_command, &ctx),
        _ => unreachable!("clap should ensure we don't get here"),
    }
}

fn main() {
    let matches = command_argument_builder().get_matches();

    tracing_subscriber::fmt()
        .with_max_level(log_level(&matches))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&matches) {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
