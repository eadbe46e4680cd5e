// Report generation for previews, import runs and stored entry trees

use crate::duplicator::EntryPreview;
use crate::entry::{Entry, EntryId, Section};
use crate::import::ImportResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

const BANNER: &str =
    "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("Unknown report format: {}", other)),
        }
    }
}

fn push_header(report: &mut String, title: &str) {
    report.push_str(BANNER);
    report.push_str(&format!("{:^80}\n", title));
    report.push_str(BANNER);
    report.push('\n');
}

fn metadata(kind: &str) -> serde_json::Value {
    serde_json::json!({
        "generator": "Sitetree",
        "version": env!("CARGO_PKG_VERSION"),
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "kind": kind,
    })
}

/// Tree glyph prefix for an entry at `depth`. Depth 0 and 1 are both roots.
fn tree_prefix(depth: usize) -> String {
    if depth <= 1 {
        "├── ".to_string()
    } else {
        format!("{}└── ", "│   ".repeat(depth - 1))
    }
}

pub fn generate_preview_text_report(previews: &[EntryPreview]) -> String {
    let mut report = String::new();
    push_header(&mut report, "SITETREE IMPORT PREVIEW");

    if previews.is_empty() {
        report.push_str("  (no entries)\n");
        return report;
    }

    for preview in previews {
        report.push_str(&format!(
            "{}{}  [/{}]  (row {})\n",
            tree_prefix(preview.depth),
            preview.title,
            preview.slug,
            preview.row
        ));

        let indent = "    ".repeat(preview.depth.max(1));
        if !preview.heading.is_empty() {
            report.push_str(&format!("{}heading: {}\n", indent, preview.heading));
        }
        if !preview.seo_description.is_empty() {
            report.push_str(&format!("{}seo:     {}\n", indent, preview.seo_description));
        }
        if let Some(parent_id) = preview.parent_id {
            report.push_str(&format!("{}parent:  #{}\n", indent, parent_id));
        }
    }

    report.push('\n');
    report.push_str(&format!("{} entries would be created\n", previews.len()));
    report
}

pub fn generate_preview_json_report(
    previews: &[EntryPreview],
) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": metadata("preview"),
            "total": previews.len(),
            "previews": previews,
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_import_text_report(result: &ImportResult) -> String {
    let mut report = String::new();
    push_header(&mut report, "SITETREE IMPORT REPORT");

    let status = if result.success { "Success" } else { "Failed" };
    report.push_str(&format!("Status:    {}\n", status));
    report.push_str(&format!("Message:   {}\n", result.message));
    report.push_str(&format!("Imported:  {}\n", result.imported_count));
    report.push_str(&format!("Errors:    {}\n", result.errors.len()));

    if !result.errors.is_empty() {
        report.push('\n');
        report.push_str(BANNER);
        report.push_str("ERRORS\n");
        report.push_str(BANNER);
        report.push('\n');
        for (idx, error) in result.errors.iter().enumerate() {
            report.push_str(&format!("  [{}] {}\n", idx + 1, error));
        }
    }

    report
}

pub fn generate_import_json_report(result: &ImportResult) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": metadata("import"),
            "result": result,
        }
    });

    serde_json::to_string_pretty(&json_report)
}

/// Entries of one section, each parent followed by its children.
///
/// Entries whose parent is not in `entries` are treated as roots.
pub fn generate_entry_tree(section: &Section, entries: &[Entry]) -> String {
    let mut report = String::new();
    report.push_str(&format!("{} ({})\n", section.name, section.handle));

    if entries.is_empty() {
        report.push_str("  (empty)\n");
        return report;
    }

    let ids: HashSet<EntryId> = entries.iter().filter_map(|e| e.id).collect();
    let mut children: BTreeMap<EntryId, Vec<&Entry>> = BTreeMap::new();
    let mut roots = Vec::new();
    for entry in entries {
        match entry.parent_id {
            Some(parent) if ids.contains(&parent) && entry.id != Some(parent) => {
                children.entry(parent).or_default().push(entry)
            }
            _ => roots.push(entry),
        }
    }

    let mut visited = HashSet::new();
    push_tree_level(&mut report, &roots, &children, "", &mut visited);

    // parent cycles have no root; start each at its first entry
    while let Some(entry) = entries
        .iter()
        .find(|e| e.id.is_some_and(|id| !visited.contains(&id)))
    {
        push_tree_level(&mut report, &[entry], &children, "", &mut visited);
    }
    report
}

fn push_tree_level(
    report: &mut String,
    level: &[&Entry],
    children: &BTreeMap<EntryId, Vec<&Entry>>,
    indent: &str,
    visited: &mut HashSet<EntryId>,
) {
    for (i, entry) in level.iter().enumerate() {
        if let Some(id) = entry.id {
            if !visited.insert(id) {
                continue;
            }
        }

        let is_last = i == level.len() - 1;
        let prefix = if is_last { "└── " } else { "├── " };
        let id = entry.id.map(|id| format!("#{}", id)).unwrap_or_default();
        report.push_str(&format!(
            "{}{}{}  [/{}] {}\n",
            indent, prefix, entry.title, entry.slug, id
        ));

        if let Some(kids) = entry.id.and_then(|id| children.get(&id)) {
            let next = format!("{}{}", indent, if is_last { "    " } else { "│   " });
            push_tree_level(report, kids, children, &next, visited);
        }
    }
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
