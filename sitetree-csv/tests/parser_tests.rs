// Tests for CSV parsing

use sitetree_csv::{CsvError, CsvParser};
use std::io::Write;
use tempfile::NamedTempFile;

fn parse(content: &str) -> Result<sitetree_csv::CsvTable, CsvError> {
    CsvParser::new().parse_reader(content.as_bytes())
}

// ============================================================================
// Header Tests
// ============================================================================

#[test]
fn test_headers_are_trimmed() {
    let table = parse(" Address , Slug ,Title\n/a,a,A\n").unwrap();
    assert_eq!(table.headers, vec!["Address", "Slug", "Title"]);
}

#[test]
fn test_bom_is_stripped_from_first_header() {
    let table = parse("\u{feff}Address,Slug\n/a,a\n").unwrap();
    assert_eq!(table.headers[0], "Address");
    assert_eq!(table.rows[0].get("Address"), Some("/a"));
}

#[test]
fn test_empty_headers_rejected() {
    let result = parse(" , ,\n/a,a,A\n");
    assert!(matches!(result, Err(CsvError::NoHeaders)));
}

#[test]
fn test_empty_input_rejected() {
    let result = parse("");
    assert!(matches!(result, Err(CsvError::NoHeaders)));
}

// ============================================================================
// Row Tests
// ============================================================================

#[test]
fn test_rows_keyed_by_header() {
    let table =
        parse("Address,Slug\nhttps://example.com/about, about \n/about/team,team\n").unwrap();

    assert_eq!(table.total_rows(), 2);
    assert_eq!(table.rows[0].get("Address"), Some("https://example.com/about"));
    assert_eq!(table.rows[0].get("Slug"), Some("about"));
    assert_eq!(table.rows[1].get("Slug"), Some("team"));
}

#[test]
fn test_short_record_lacks_trailing_cells() {
    let table = parse("Address,Slug,Title\n/a,a,A\n/b\n").unwrap();

    let short = &table.rows[1];
    assert_eq!(short.get("Address"), Some("/b"));
    assert_eq!(short.get("Slug"), None);
    assert!(!short.contains("Title"));
}

#[test]
fn test_surplus_cells_dropped() {
    let table = parse("Address,Slug\n/a,a,extra,more\n").unwrap();
    assert_eq!(table.rows[0].len(), 2);
}

#[test]
fn test_quoted_cells_with_commas() {
    let table = parse("Title,Slug\n\"Hello, world\",hello\n").unwrap();
    assert_eq!(table.rows[0].get("Title"), Some("Hello, world"));
}

#[test]
fn test_custom_delimiter() {
    let table = CsvParser::new()
        .with_delimiter(b';')
        .parse_reader("Address;Slug\n/a;a\n".as_bytes())
        .unwrap();
    assert_eq!(table.rows[0].get("Slug"), Some("a"));
}

// ============================================================================
// File Tests
// ============================================================================

#[test]
fn test_parse_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, "Address,Slug,Title")?;
    writeln!(temp_file, "https://example.com/,home,Home")?;
    writeln!(temp_file, "https://example.com/about,about,About")?;

    let table = CsvParser::new().parse_file(temp_file.path())?;
    assert_eq!(table.total_rows(), 2);
    assert_eq!(table.preview(1)[0].get("Title"), Some("Home"));
    Ok(())
}

#[test]
fn test_parse_missing_file() {
    let result = CsvParser::new().parse_file(std::path::Path::new("/nonexistent/export.csv"));
    assert!(matches!(result, Err(CsvError::NotFound(_))));
}
