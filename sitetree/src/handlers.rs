use anyhow::{Context, Result, anyhow, bail};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use sitetree_core::data::Database;
use sitetree_core::duplicator::EntryPreview;
use sitetree_core::entry::{Entry, EntryId, HEADING_FIELD};
use sitetree_core::error::SiteTreeError;
use sitetree_core::import::{
    ImportOptions, ImportProgressCallback, ImportResult, PreviewOptions, import_entries,
    preview_entries, validate_import_target,
};
use sitetree_core::mapping::{FieldMappings, MappingTarget};
use sitetree_core::report::{
    ReportFormat, generate_entry_tree, generate_import_json_report, generate_import_text_report,
    generate_preview_json_report, generate_preview_text_report, save_report,
};
use sitetree_core::store::EntryStore;
use sitetree_csv::{CsvParser, CsvTable};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const DB_FILE_NAME: &str = "sitetree.db";

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub db_path: PathBuf,
    pub quiet: bool,
}

/// What one preview or import run reads.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub input: PathBuf,
    pub template_id: EntryId,
    pub mappings: FieldMappings,
    pub skip_first_row: bool,
    pub parent_id: Option<EntryId>,
}

// Helper functions

/// Expand `~` in a user supplied path
pub fn resolve_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

pub fn open_database(path: &Path) -> Result<Database> {
    if !Database::exists(path) {
        bail!(
            "Database not found at {}. Run `sitetree init` first.",
            path.display()
        );
    }
    Database::new(path).with_context(|| format!("Failed to open database {}", path.display()))
}

pub fn load_table(path: &Path) -> Result<CsvTable> {
    CsvParser::new()
        .parse_file(path)
        .with_context(|| format!("Failed to read CSV file {}", path.display()))
}

/// Mapping file entries first, then `-m COLUMN=TARGET` pairs in order.
pub fn load_mappings(pairs: &[String], mapping_file: Option<&Path>) -> Result<FieldMappings> {
    let mut mappings = match mapping_file {
        Some(path) => FieldMappings::load(path)
            .with_context(|| format!("Failed to load mapping file {}", path.display()))?,
        None => FieldMappings::new(),
    };
    mappings.extend(FieldMappings::from_pairs(pairs)?);

    if mappings.is_empty() {
        bail!(
            "No field mappings given. Use -m COLUMN=TARGET or --mapping-file \
             (see `sitetree fields`)."
        );
    }
    Ok(mappings)
}

/// Parse `handle=value`. The value is JSON when it parses as JSON and a
/// plain string otherwise.
pub fn parse_field_arg(arg: &str) -> Result<(String, Value)> {
    let (handle, raw) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("Field '{}' must look like HANDLE=VALUE", arg))?;
    let handle = handle.trim();
    if handle.is_empty() {
        bail!("Field '{}' has an empty handle", arg);
    }

    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((handle.to_string(), value))
}

fn request_from_args(args: &ArgMatches) -> Result<ImportRequest> {
    let pairs: Vec<String> = args
        .get_many::<String>("map")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let mapping_file = args.get_one::<PathBuf>("mapping-file");

    Ok(ImportRequest {
        input: args
            .get_one::<PathBuf>("input")
            .cloned()
            .ok_or_else(|| anyhow!("--input is required"))?,
        template_id: args
            .get_one::<i64>("template")
            .copied()
            .ok_or_else(|| anyhow!("--template is required"))?,
        mappings: load_mappings(&pairs, mapping_file.map(PathBuf::as_path))?,
        skip_first_row: args.get_flag("skip-first-row"),
        parent_id: args.get_one::<i64>("parent").copied(),
    })
}

fn report_format(args: &ArgMatches) -> Result<ReportFormat> {
    let raw = args.get_one::<String>("format").map(String::as_str).unwrap_or("text");
    raw.parse::<ReportFormat>().map_err(|e| anyhow!(e))
}

fn print_mapping_warnings(mappings: &FieldMappings) {
    for problem in mappings.validate() {
        warn!("{}", problem);
        eprintln!("{} {}", "⚠".yellow().bold(), problem.yellow());
    }
}

fn emit_report(content: &str, output: Option<&PathBuf>, quiet: bool) -> Result<()> {
    match output {
        Some(path) => {
            save_report(content, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !quiet {
                println!(
                    "{} Report saved to: {}",
                    "✓".green().bold(),
                    path.display().to_string().bright_white()
                );
            }
        }
        None => print!("{}", content),
    }
    Ok(())
}

pub fn render_preview_report(previews: &[EntryPreview], format: ReportFormat) -> Result<String> {
    Ok(match format {
        ReportFormat::Text => generate_preview_text_report(previews),
        ReportFormat::Json => generate_preview_json_report(previews)?,
    })
}

pub fn render_import_report(result: &ImportResult, format: ReportFormat) -> Result<String> {
    Ok(match format {
        ReportFormat::Text => generate_import_text_report(result),
        ReportFormat::Json => generate_import_json_report(result)?,
    })
}

/// Validate the target, read the CSV and preview without saving.
pub fn execute_preview(
    db: &Database,
    request: &ImportRequest,
    limit: usize,
) -> Result<Vec<EntryPreview>> {
    let target = validate_import_target(db, request.template_id, request.parent_id)?;
    let table = load_table(&request.input)?;
    info!(
        "Previewing {} rows from {} using template {}",
        table.total_rows(),
        request.input.display(),
        target.summary()
    );

    let options = PreviewOptions {
        limit,
        skip_first_row: request.skip_first_row,
        parent_id: request.parent_id,
    };
    Ok(preview_entries(
        db,
        &target.template,
        &table.rows,
        &request.mappings,
        &options,
    ))
}

/// Validate the target, read the CSV and import every row.
pub fn execute_import(
    db: &Database,
    request: &ImportRequest,
    progress_callback: Option<ImportProgressCallback>,
) -> Result<ImportResult> {
    let target = validate_import_target(db, request.template_id, request.parent_id)?;
    let table = load_table(&request.input)?;
    info!(
        "Importing {} rows from {} using template {}",
        table.total_rows(),
        request.input.display(),
        target.summary()
    );

    let options = ImportOptions {
        skip_first_row: request.skip_first_row,
        parent_id: request.parent_id,
        cancel: None,
    };
    Ok(import_entries(
        db,
        &target.template,
        &table.rows,
        &request.mappings,
        &options,
        progress_callback,
    ))
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_header(title: &str) {
    print_divider();
    println!("{}", format!("  {}", title).bright_white().bold());
    print_divider();
    println!();
}

fn print_prompt(msg: &str) -> io::Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

// Handlers

pub fn handle_init(args: &ArgMatches, ctx: &CliContext) -> Result<()> {
    if !ctx.quiet {
        print_header("SITETREE INITIALIZATION");
    }

    let raw_path = args
        .get_one::<String>("PATH")
        .map(String::as_str)
        .unwrap_or("~/.config/sitetree/");
    let force = args.get_flag("force");
    let config_dir = resolve_path(raw_path);
    let db_path = config_dir.join(DB_FILE_NAME);

    println!(
        "{} Target: {}",
        "→".blue(),
        config_dir.display().to_string().bright_white()
    );

    fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create config directory {}", config_dir.display()))?;

    if Database::exists(&db_path) {
        let overwrite = if force {
            true
        } else {
            println!("{}", "⚠ WARNING".yellow().bold());
            println!(
                "Database already exists at: {}",
                db_path.display().to_string().bright_white()
            );
            let response = print_prompt("Would you like to overwrite it? [y/N]:")?;
            response == "y" || response == "yes"
        };

        if overwrite {
            Database::drop(&db_path)
                .with_context(|| format!("Failed to remove {}", db_path.display()))?;
            println!("{} Existing database removed", "✓".green().bold());
        } else {
            println!("{} Keeping existing database", "→".blue());
        }
    }

    if !Database::exists(&db_path) {
        println!("{} Creating database...", "→".blue());
        Database::new(&db_path)
            .with_context(|| format!("Failed to create database {}", db_path.display()))?;
    }

    println!(
        "{} Database: {}",
        "✓".green().bold(),
        db_path.display().to_string().bright_white()
    );
    if db_path != ctx.db_path {
        println!(
            "{} Pass --db {} to use it from other commands",
            "ℹ".blue(),
            db_path.display()
        );
    }
    Ok(())
}

pub fn handle_section_add(args: &ArgMatches, ctx: &CliContext) -> Result<()> {
    let db = open_database(&ctx.db_path)?;
    let name = args
        .get_one::<String>("name")
        .ok_or_else(|| anyhow!("--name is required"))?;
    let handle = args.get_one::<String>("handle").map(String::as_str).unwrap_or("");

    let section = db
        .create_section(name, handle)
        .with_context(|| format!("Failed to create section '{}'", name))?;
    println!(
        "{} Created section '{}' (ID: {}, handle: {})",
        "✓".green().bold(),
        section.name.bright_white(),
        section.id,
        section.handle
    );
    Ok(())
}

pub fn handle_section_list(ctx: &CliContext) -> Result<()> {
    let db = open_database(&ctx.db_path)?;
    let sections = db.list_sections()?;

    if sections.is_empty() {
        println!("No sections yet. Create one with `sitetree section add -n NAME`.");
        return Ok(());
    }

    if !ctx.quiet {
        println!("{:>5}  {:<30} {}", "ID".bold(), "NAME".bold(), "HANDLE".bold());
    }
    for section in sections {
        let count = db.list_entries(section.id)?.len();
        println!(
            "{:>5}  {:<30} {} ({} entries)",
            section.id, section.name, section.handle, count
        );
    }
    Ok(())
}

pub fn handle_entry_add(args: &ArgMatches, ctx: &CliContext) -> Result<()> {
    let db = open_database(&ctx.db_path)?;
    let section_id = *args
        .get_one::<i64>("section")
        .ok_or_else(|| anyhow!("--section is required"))?;
    let title = args
        .get_one::<String>("title")
        .ok_or_else(|| anyhow!("--title is required"))?;

    let mut entry = Entry::new(section_id)
        .with_title(title.as_str())
        .with_parent(args.get_one::<i64>("parent").copied());
    if let Some(slug) = args.get_one::<String>("slug") {
        entry.slug = slug.clone();
    }
    if let Some(heading) = args.get_one::<String>("heading") {
        entry.set_field(HEADING_FIELD, Value::String(heading.clone()));
    }
    if let Some(fields) = args.get_many::<String>("field") {
        for field in fields {
            let (handle, value) = parse_field_arg(field)?;
            entry.set_field(handle, value);
        }
    }

    let id = db
        .save_entry(&entry)
        .with_context(|| format!("Failed to create entry '{}'", title))?;
    println!(
        "{} Created entry '{}' (ID: {})",
        "✓".green().bold(),
        title.bright_white(),
        id
    );
    Ok(())
}

pub fn handle_entry_list(args: &ArgMatches, ctx: &CliContext) -> Result<()> {
    let db = open_database(&ctx.db_path)?;
    let section_id = *args
        .get_one::<i64>("section")
        .ok_or_else(|| anyhow!("--section is required"))?;

    let section = db
        .get_section(section_id)?
        .ok_or(SiteTreeError::SectionNotFound(section_id))?;
    let entries = db.list_entries(section_id)?;
    print!("{}", generate_entry_tree(&section, &entries));
    Ok(())
}

pub fn handle_fields() -> Result<()> {
    println!("{:<20} {:<22} {}", "TARGET".bold(), "LABEL".bold(), "REQUIRED".bold());
    for target in MappingTarget::available() {
        let required = if target.is_required() {
            "yes".green().to_string()
        } else {
            "no".dimmed().to_string()
        };
        println!("{:<20} {:<22} {}", target.id(), target.label(), required);
    }
    Ok(())
}

pub fn handle_inspect(args: &ArgMatches, ctx: &CliContext) -> Result<()> {
    let input = args
        .get_one::<PathBuf>("input")
        .ok_or_else(|| anyhow!("--input is required"))?;
    let n = args.get_one::<usize>("rows").copied().unwrap_or(5);
    let table = load_table(input)?;

    if !ctx.quiet {
        print_header("CSV INSPECTION");
    }
    println!("{} Headers: {}", "→".blue(), table.headers.join(", ").bright_white());
    println!("{} Total rows: {}", "→".blue(), table.total_rows().to_string().cyan());

    for (i, row) in table.preview(n).iter().enumerate() {
        println!();
        println!("{}", format!("Row {}", i + 1).bold());
        for (header, value) in row.iter() {
            println!("  {}: {}", header.bright_blue(), value);
        }
    }
    Ok(())
}

pub fn handle_preview(args: &ArgMatches, ctx: &CliContext) -> Result<()> {
    let db = open_database(&ctx.db_path)?;
    let request = request_from_args(args)?;
    let limit = args.get_one::<usize>("limit").copied().unwrap_or(50);
    let format = report_format(args)?;
    print_mapping_warnings(&request.mappings);

    let previews = execute_preview(&db, &request, limit)?;
    let report = render_preview_report(&previews, format)?;
    emit_report(&report, args.get_one::<PathBuf>("output"), ctx.quiet)
}

pub fn handle_import(args: &ArgMatches, ctx: &CliContext) -> Result<()> {
    let db = open_database(&ctx.db_path)?;
    let request = request_from_args(args)?;
    let format = report_format(args)?;
    print_mapping_warnings(&request.mappings);

    let spinner = if ctx.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Reading {}", request.input.display()));

    let bar = spinner.clone();
    let progress_callback: ImportProgressCallback =
        Arc::new(move |msg: String| bar.set_message(msg));
    let outcome = execute_import(&db, &request, Some(progress_callback));
    spinner.finish_and_clear();
    let result = outcome?;

    let report = render_import_report(&result, format)?;
    emit_report(&report, args.get_one::<PathBuf>("output"), ctx.quiet)?;

    if !result.success {
        bail!("{}", result.message);
    }
    if !ctx.quiet {
        println!("{} {}", "✓".green().bold(), result.message);
    }
    Ok(())
}
