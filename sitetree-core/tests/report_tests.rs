// Tests for report generation functionality

use sitetree_core::duplicator::EntryPreview;
use sitetree_core::entry::{Entry, Section};
use sitetree_core::import::ImportResult;
use sitetree_core::report::{
    ReportFormat, generate_entry_tree, generate_import_json_report, generate_import_text_report,
    generate_preview_json_report, generate_preview_text_report, save_report,
};
use tempfile::TempDir;

fn preview(row: usize, title: &str, slug: &str, depth: usize) -> EntryPreview {
    EntryPreview {
        row,
        title: title.to_string(),
        slug: slug.to_string(),
        depth,
        ..Default::default()
    }
}

fn stored(id: i64, title: &str, parent_id: Option<i64>) -> Entry {
    let mut entry = Entry::new(1)
        .with_title(title)
        .with_slug(title.to_lowercase())
        .with_parent(parent_id);
    entry.id = Some(id);
    entry
}

fn pages() -> Section {
    Section {
        id: 1,
        name: "Pages".to_string(),
        handle: "pages".to_string(),
    }
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str_text() {
    assert_eq!("text".parse::<ReportFormat>(), Ok(ReportFormat::Text));
}

#[test]
fn test_report_format_from_str_json() {
    assert_eq!("json".parse::<ReportFormat>(), Ok(ReportFormat::Json));
}

#[test]
fn test_report_format_from_str_case_insensitive() {
    assert_eq!("JSON".parse::<ReportFormat>(), Ok(ReportFormat::Json));
    assert_eq!("Text".parse::<ReportFormat>(), Ok(ReportFormat::Text));
}

#[test]
fn test_report_format_from_str_invalid() {
    assert!("html".parse::<ReportFormat>().is_err());
    assert!("".parse::<ReportFormat>().is_err());
}

// ============================================================================
// Preview Report Tests
// ============================================================================

#[test]
fn test_preview_text_report_structure() {
    let mut team = preview(3, "Our Team", "team", 2);
    team.heading = "<h1>Team</h1>".to_string();
    team.seo_description = "The people".to_string();
    let previews = vec![preview(2, "About", "about", 1), team];

    let report = generate_preview_text_report(&previews);

    assert!(report.contains("SITETREE IMPORT PREVIEW"));
    assert!(report.contains("├── About  [/about]  (row 2)"));
    assert!(report.contains("│   └── Our Team  [/team]  (row 3)"));
    assert!(report.contains("heading: <h1>Team</h1>"));
    assert!(report.contains("seo:     The people"));
    assert!(report.contains("2 entries would be created"));
}

#[test]
fn test_preview_text_report_shows_explicit_parent() {
    let mut about = preview(1, "About", "about", 1);
    about.parent_id = Some(42);

    let report = generate_preview_text_report(&[about]);
    assert!(report.contains("parent:  #42"));
}

#[test]
fn test_preview_text_report_empty() {
    let report = generate_preview_text_report(&[]);
    assert!(report.contains("(no entries)"));
}

#[test]
fn test_preview_json_report() {
    let previews = vec![preview(1, "Home", "home", 0)];
    let json = generate_preview_json_report(&previews).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["report"]["metadata"]["generator"], "Sitetree");
    assert_eq!(value["report"]["metadata"]["kind"], "preview");
    assert!(value["report"]["metadata"]["generated_at"].is_string());
    assert_eq!(value["report"]["total"], 1);
    assert_eq!(value["report"]["previews"][0]["slug"], "home");
    assert_eq!(value["report"]["previews"][0]["seoDescription"], "");
}

// ============================================================================
// Import Report Tests
// ============================================================================

#[test]
fn test_import_text_report_success() {
    let result = ImportResult {
        success: true,
        message: "Successfully imported 2 entries".to_string(),
        imported_count: 2,
        errors: vec!["Row 3: Validation failed: Title cannot be blank".to_string()],
    };

    let report = generate_import_text_report(&result);
    assert!(report.contains("Status:    Success"));
    assert!(report.contains("Imported:  2"));
    assert!(report.contains("ERRORS"));
    assert!(report.contains("[1] Row 3: Validation failed: Title cannot be blank"));
}

#[test]
fn test_import_text_report_failure_without_errors_section() {
    let result = ImportResult {
        success: false,
        message: "No entries were imported".to_string(),
        imported_count: 0,
        errors: vec![],
    };

    let report = generate_import_text_report(&result);
    assert!(report.contains("Status:    Failed"));
    assert!(!report.contains("ERRORS"));
}

#[test]
fn test_import_json_report() {
    let result = ImportResult {
        success: true,
        message: "Successfully imported 1 entries".to_string(),
        imported_count: 1,
        errors: vec![],
    };

    let json = generate_import_json_report(&result).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["report"]["metadata"]["kind"], "import");
    assert_eq!(value["report"]["result"]["importedCount"], 1);
    assert_eq!(value["report"]["result"]["success"], true);
}

// ============================================================================
// Entry Tree Tests
// ============================================================================

#[test]
fn test_entry_tree_nests_children() {
    let entries = vec![
        stored(1, "Home", None),
        stored(2, "About", None),
        stored(3, "Team", Some(2)),
        stored(4, "Careers", Some(2)),
    ];

    let tree = generate_entry_tree(&pages(), &entries);
    let lines: Vec<&str> = tree.lines().collect();

    assert_eq!(lines[0], "Pages (pages)");
    assert_eq!(lines[1], "├── Home  [/home] #1");
    assert_eq!(lines[2], "└── About  [/about] #2");
    assert_eq!(lines[3], "    ├── Team  [/team] #3");
    assert_eq!(lines[4], "    └── Careers  [/careers] #4");
}

#[test]
fn test_entry_tree_orphans_become_roots() {
    let entries = vec![stored(5, "Lost", Some(99))];
    let tree = generate_entry_tree(&pages(), &entries);
    assert!(tree.contains("└── Lost  [/lost] #5"));
}

#[test]
fn test_entry_tree_cycle_terminates() {
    let entries = vec![stored(1, "A", Some(2)), stored(2, "B", Some(1))];
    let tree = generate_entry_tree(&pages(), &entries);
    let lines: Vec<&str> = tree.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "└── A  [/a] #1");
    assert_eq!(lines[2], "    └── B  [/b] #2");
}

#[test]
fn test_entry_tree_empty() {
    let tree = generate_entry_tree(&pages(), &[]);
    assert!(tree.contains("(empty)"));
}

// ============================================================================
// Save Report Tests
// ============================================================================

#[test]
fn test_save_report_writes_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("report.txt");

    save_report("hello report", &path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello report");
}
