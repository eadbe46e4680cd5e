use crate::duplicator::{EntryDuplicator, EntryPreview};
use crate::entry::{Entry, EntryId, Section};
use crate::error::{Result, SiteTreeError};
use crate::hierarchy::{
    HierarchyMap, HierarchyResolver, build_hierarchy_map, sorted_hierarchy_map,
    tree_ordered_hierarchy_map,
};
use crate::mapping::FieldMappings;
use crate::store::EntryStore;
use serde::Serialize;
use sitetree_csv::Row;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

pub const DEFAULT_PREVIEW_LIMIT: usize = 50;

/// Callback for reporting per-row progress
pub type ImportProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

#[derive(Clone, Default)]
pub struct ImportOptions {
    /// Leave row 0 (usually the homepage) out of the run entirely.
    pub skip_first_row: bool,
    /// Parent for rows whose CSV hierarchy yields none.
    pub parent_id: Option<EntryId>,
    /// Checked between rows.
    pub cancel: Option<Arc<AtomicBool>>,
}

#[derive(Debug, Clone)]
pub struct PreviewOptions {
    pub limit: usize,
    pub skip_first_row: bool,
    pub parent_id: Option<EntryId>,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PREVIEW_LIMIT,
            skip_first_row: false,
            parent_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub success: bool,
    pub message: String,
    pub imported_count: usize,
    pub errors: Vec<String>,
}

impl ImportResult {
    fn new(imported_count: usize, errors: Vec<String>, cancelled: bool) -> Self {
        let mut message = if imported_count > 0 {
            format!("Successfully imported {} entries", imported_count)
        } else {
            "No entries were imported".to_string()
        };
        if cancelled {
            message.push_str(" (cancelled)");
        }

        Self {
            success: imported_count > 0,
            message,
            imported_count,
            errors,
        }
    }
}

/// The template and optional explicit parent an import will use, after the
/// checks a caller must make before handing them to the drivers.
#[derive(Debug, Clone)]
pub struct ImportTarget {
    pub template: Entry,
    pub section: Option<Section>,
    pub parent: Option<Entry>,
}

impl ImportTarget {
    /// One-line description for logs, e.g. `'Template' in Pages under 'About'`.
    pub fn summary(&self) -> String {
        let section = match &self.section {
            Some(section) => section.name.clone(),
            None => format!("#{}", self.template.section_id),
        };
        let mut summary = format!("'{}' in {}", self.template.title, section);
        if let Some(parent) = &self.parent {
            summary.push_str(&format!(" under '{}'", parent.title));
        }
        summary
    }
}

/// Template must exist; an explicit parent must exist and share its section.
pub fn validate_import_target<S: EntryStore + ?Sized>(
    store: &S,
    template_id: EntryId,
    parent_id: Option<EntryId>,
) -> Result<ImportTarget> {
    let template = store
        .get_entry(template_id)?
        .ok_or(SiteTreeError::TemplateNotFound)?;
    let section = store.get_section(template.section_id)?;

    let parent = match parent_id {
        Some(parent_id) => {
            let parent = store
                .get_entry(parent_id)?
                .ok_or(SiteTreeError::ParentNotFound)?;

            if parent.section_id != template.section_id {
                let section_name = |id: i64| -> Result<String> {
                    Ok(store
                        .get_section(id)?
                        .map(|s| s.name)
                        .unwrap_or_else(|| format!("#{}", id)))
                };
                return Err(SiteTreeError::SectionMismatch {
                    parent_title: parent.title.clone(),
                    parent_section: section_name(parent.section_id)?,
                    template_title: template.title.clone(),
                    template_section: section_name(template.section_id)?,
                });
            }
            Some(parent)
        }
        None => None,
    };

    Ok(ImportTarget {
        template,
        section,
        parent,
    })
}

fn prepare_hierarchy(rows: &[Row], mappings: &FieldMappings, skip_first_row: bool) -> HierarchyMap {
    let mut map = build_hierarchy_map(rows, mappings);
    if skip_first_row && map.remove(0).is_some() {
        info!("Skipping first row (homepage)");
    }
    map
}

/// Rows the hierarchy map does not cover, in row order.
fn unmapped_rows(rows: &[Row], map: &HierarchyMap, skip_first_row: bool) -> Vec<usize> {
    (0..rows.len())
        .filter(|&i| !(skip_first_row && i == 0))
        .filter(|&i| !map.contains(i))
        .collect()
}

fn is_cancelled(cancel: &Option<Arc<AtomicBool>>) -> bool {
    cancel
        .as_ref()
        .map(|flag| flag.load(Ordering::Relaxed))
        .unwrap_or(false)
}

/// Create one entry per row, parents before children.
///
/// A failing row is recorded and skipped; nothing already created is rolled
/// back.
pub fn import_entries<S: EntryStore + ?Sized>(
    store: &S,
    template: &Entry,
    rows: &[Row],
    mappings: &FieldMappings,
    options: &ImportOptions,
    progress_callback: Option<ImportProgressCallback>,
) -> ImportResult {
    info!(
        "Starting import for {} rows, skip first row: {}",
        rows.len(),
        options.skip_first_row
    );

    let mut map = prepare_hierarchy(rows, mappings, options.skip_first_row);
    let mut order: Vec<usize> = sorted_hierarchy_map(&map).into_iter().map(|(i, _)| i).collect();
    let unmapped = unmapped_rows(rows, &map, options.skip_first_row);
    if !unmapped.is_empty() {
        warn!(
            "{} rows have no hierarchy information and will be imported without a CSV parent",
            unmapped.len()
        );
    }
    order.extend(unmapped);

    let mut resolver = HierarchyResolver::new(store);
    let duplicator = EntryDuplicator::new(store);
    let total = order.len();
    let mut imported_count = 0;
    let mut errors = Vec::new();
    let mut cancelled = false;

    for (position, row_index) in order.into_iter().enumerate() {
        if is_cancelled(&options.cancel) {
            warn!("Import cancelled after {} of {} rows", position, total);
            cancelled = true;
            break;
        }

        let row_number = row_index + 1;
        let row = &rows[row_index];
        let csv_parent = resolver.parent_entry_id_for_row(&map, row_index);
        let parent_id = csv_parent.or(options.parent_id);

        if let Some(ref callback) = progress_callback {
            let label = map
                .get(row_index)
                .map(|e| e.slug.clone())
                .unwrap_or_else(|| format!("row {}", row_number));
            callback(format!("Importing {}/{}: {}", position + 1, total, label));
        }

        match duplicator.duplicate_and_populate(template, row, mappings, parent_id) {
            Ok(entry_id) => {
                imported_count += 1;
                if let Some(entry) = map.get_mut(row_index) {
                    entry.parent_entry_id = csv_parent;
                    entry.processed = true;
                    let slug = entry.slug.clone();
                    resolver.cache_entry_slug(&slug, entry_id);
                }
            }
            Err(e) => {
                error!("Import error on row {}: {}", row_number, e);
                errors.push(format!("Row {}: {}", row_number, e));
            }
        }
    }

    let result = ImportResult::new(imported_count, errors, cancelled);
    info!(
        "Import completed: {} created, {} errors",
        result.imported_count,
        result.errors.len()
    );
    result
}

/// Describe up to `limit` entries in tree order without saving anything.
pub fn preview_entries<S: EntryStore + ?Sized>(
    store: &S,
    template: &Entry,
    rows: &[Row],
    mappings: &FieldMappings,
    options: &PreviewOptions,
) -> Vec<EntryPreview> {
    info!(
        "Starting preview for template {:?} with {} rows",
        template.id,
        rows.len()
    );

    let map = prepare_hierarchy(rows, mappings, options.skip_first_row);
    let mut order: Vec<usize> = tree_ordered_hierarchy_map(&map)
        .into_iter()
        .map(|(i, _)| i)
        .collect();
    order.extend(unmapped_rows(rows, &map, options.skip_first_row));

    let duplicator = EntryDuplicator::new(store);
    let mut previews = Vec::new();

    for row_index in order {
        if previews.len() >= options.limit {
            break;
        }

        match duplicator.create_preview(template, &rows[row_index], mappings) {
            Ok(mut preview) => {
                preview.row = row_index + 1;
                match map.get(row_index) {
                    Some(info) => {
                        preview.depth = info.depth();
                        preview.parent_slug = info.path_info.parent_slug.clone();
                        preview.url = Some(info.url.clone());
                        if info.path_info.is_top_level() {
                            preview.parent_id = options.parent_id;
                        }
                    }
                    None => preview.parent_id = options.parent_id,
                }
                previews.push(preview);
            }
            Err(e) => warn!("Failed to create preview for row {}: {}", row_index + 1, e),
        }
    }

    info!("Created {} previews", previews.len());
    previews
}
