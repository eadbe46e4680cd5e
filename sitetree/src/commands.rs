use crate::CLAP_STYLING;
use clap::{ArgAction, Command, arg, command, value_parser};
use std::path::PathBuf;

fn input_args(cmd: Command) -> Command {
    cmd.arg(
        arg!(-i --"input" <FILE>)
            .required(true)
            .help("CSV export to read (first line is the header row)")
            .value_parser(value_parser!(PathBuf)),
    )
    .arg(
        arg!(-t --"template" <ENTRY_ID>)
            .required(true)
            .help("ID of the entry every new entry is copied from")
            .value_parser(value_parser!(i64)),
    )
    .arg(
        arg!(-m --"map" <COLUMN_EQ_TARGET>)
            .required(false)
            .help("Map a CSV column to a target field, e.g. -m Address=hierarchy.address")
            .action(ArgAction::Append),
    )
    .arg(
        arg!(--"mapping-file" <PATH>)
            .required(false)
            .help("JSON file of [{\"column\": ..., \"target\": ...}] mappings")
            .value_parser(value_parser!(PathBuf)),
    )
    .arg(
        arg!(--"skip-first-row")
            .required(false)
            .help("Leave out the first data row (usually the homepage)")
            .action(ArgAction::SetTrue),
    )
    .arg(
        arg!(-p --"parent" <ENTRY_ID>)
            .required(false)
            .help("Parent for rows whose URL gives them no parent")
            .value_parser(value_parser!(i64)),
    )
    .arg(
        arg!(--"format" <FORMAT>)
            .required(false)
            .help("Report format: text, json")
            .value_parser(["text", "json"])
            .default_value("text"),
    )
    .arg(
        arg!(-o --"output" <PATH>)
            .required(false)
            .help("Save report to file (default: display to screen)")
            .value_parser(value_parser!(PathBuf)),
    )
}

pub(crate) fn command_argument_builder() -> Command {
    Command::new("sitetree")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitetree")
        .styles(CLAP_STYLING)
        .about("Import SEO crawl exports as hierarchies of content entries")
        .arg(arg!(-q --"quiet" "Suppress headers and non-essential output").required(false))
        .arg(
            arg!(-v --"verbose" ...)
                .help("Increase log verbosity (-v info, -vv debug, -vvv trace)")
                .action(ArgAction::Count)
                .global(true),
        )
        .arg(
            arg!(--"db" <PATH>)
                .required(false)
                .help("Path to the sitetree database")
                .default_value("~/.config/sitetree/sitetree.db")
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            command!("init")
                .about("Initializes the sitetree database on your filesystem")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Directory to store the sitetree database in")
                        .default_value("~/.config/sitetree/"),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Overwrite any existing database at the specified location.")
                        .required(false),
                ),
        )
        .subcommand(
            command!("section")
                .about("Manage content sections")
                .subcommand_required(true)
                .subcommand(
                    command!("add")
                        .about("Creates a section")
                        .arg(
                            arg!(-n --"name" <NAME>)
                                .required(true)
                                .help("The name of the section"),
                        )
                        .arg(
                            arg!(--"handle" <HANDLE>)
                                .required(false)
                                .help("Unique handle (default: derived from the name)"),
                        ),
                )
                .subcommand(command!("list").about("List all sections")),
        )
        .subcommand(
            command!("entry")
                .about("Manage entries")
                .subcommand_required(true)
                .subcommand(
                    command!("add")
                        .about("Creates an entry, e.g. a template to import from")
                        .arg(
                            arg!(-s --"section" <SECTION_ID>)
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(arg!(--"title" <TITLE>).required(true))
                        .arg(
                            arg!(--"slug" <SLUG>)
                                .required(false)
                                .help("Default: derived from the title"),
                        )
                        .arg(
                            arg!(-p --"parent" <ENTRY_ID>)
                                .required(false)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(
                            arg!(--"heading" <HTML>)
                                .required(false)
                                .help("Heading HTML, e.g. '<h1>Placeholder</h1>'"),
                        )
                        .arg(
                            arg!(--"field" <HANDLE_EQ_JSON>)
                                .required(false)
                                .help(
                                    "Set a field value, e.g. --field 'seo={\"metaGlobalVars\":{}}'",
                                )
                                .action(ArgAction::Append),
                        ),
                )
                .subcommand(
                    command!("list").about("Show a section's entries as a tree").arg(
                        arg!(-s --"section" <SECTION_ID>)
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                ),
        )
        .subcommand(command!("fields").about("List the target fields CSV columns can be mapped to"))
        .subcommand(
            command!("inspect")
                .about("Show the headers and first rows of a CSV export")
                .arg(
                    arg!(-i --"input" <FILE>)
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-n --"rows" <N>)
                        .required(false)
                        .help("Number of rows to show")
                        .value_parser(value_parser!(usize))
                        .default_value("5"),
                ),
        )
        .subcommand(
            input_args(
                command!("preview")
                    .about("Show the entries an import would create, without saving"),
            )
            .arg(
                arg!(-l --"limit" <N>)
                    .required(false)
                    .help("Maximum number of previews")
                    .value_parser(value_parser!(usize))
                    .default_value("50"),
            ),
        )
        .subcommand(input_args(
            command!("import").about("Create one entry per CSV row, nested by URL path"),
        ))
}
