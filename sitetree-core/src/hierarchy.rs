//! Hierarchy resolution for CSV rows.
//!
//! Rows carry a source URL and a target slug. Their URL path depth decides
//! which rows are created first, and the second-to-last path segment names
//! the slug of the parent entry. Parent ids come from entries created earlier
//! in the same run (the [`SlugEntryCache`]) or, failing that, from the
//! [`EntryStore`].

use crate::entry::EntryId;
use crate::mapping::FieldMappings;
use crate::path::{PathInfo, parse_url_path};
use crate::store::EntryStore;
use serde::Serialize;
use sitetree_csv::Row;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyEntry {
    pub url: String,
    /// From the mapped slug column, not from the URL.
    pub slug: String,
    pub path_info: PathInfo,
    pub parent_entry_id: Option<EntryId>,
    pub processed: bool,
}

impl HierarchyEntry {
    pub fn new(url: impl Into<String>, slug: impl Into<String>) -> Self {
        let url = url.into();
        let path_info = parse_url_path(&url);
        Self {
            url,
            slug: slug.into(),
            path_info,
            parent_entry_id: None,
            processed: false,
        }
    }

    pub fn depth(&self) -> usize {
        self.path_info.depth
    }
}

/// Hierarchy entries keyed by 0-based data row index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchyMap {
    entries: BTreeMap<usize, HierarchyEntry>,
}

impl HierarchyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, row_index: usize, entry: HierarchyEntry) {
        self.entries.insert(row_index, entry);
    }

    pub fn get(&self, row_index: usize) -> Option<&HierarchyEntry> {
        self.entries.get(&row_index)
    }

    pub fn get_mut(&mut self, row_index: usize) -> Option<&mut HierarchyEntry> {
        self.entries.get_mut(&row_index)
    }

    pub fn remove(&mut self, row_index: usize) -> Option<HierarchyEntry> {
        self.entries.remove(&row_index)
    }

    pub fn contains(&self, row_index: usize) -> bool {
        self.entries.contains_key(&row_index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in row index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &HierarchyEntry)> {
        self.entries.iter().map(|(i, e)| (*i, e))
    }
}

/// Build the hierarchy map for every row that has both an address and a slug
/// cell. An empty map means hierarchy detection is off for this run.
pub fn build_hierarchy_map(rows: &[Row], mappings: &FieldMappings) -> HierarchyMap {
    let mut map = HierarchyMap::new();
    info!("Building hierarchy map with {} CSV rows", rows.len());

    let Some(address_column) = mappings.address_column() else {
        let columns: Vec<&str> = mappings.iter().map(|m| m.column.as_str()).collect();
        warn!(
            "No address field found in mappings. Available fields: {}",
            columns.join(", ")
        );
        return map;
    };

    let Some(slug_column) = mappings.slug_column() else {
        warn!("No slug field mapped. Hierarchy detection disabled.");
        return map;
    };

    for (index, row) in rows.iter().enumerate() {
        let (Some(url), Some(slug)) = (row.get(address_column), row.get(slug_column)) else {
            warn!("Skipping row {}: missing address or slug field", index);
            continue;
        };

        let entry = HierarchyEntry::new(url, slug);
        debug!(
            "Processing URL: {} -> slug: {}, depth: {}, parent slug: {}",
            url,
            slug,
            entry.depth(),
            entry.path_info.parent_slug.as_deref().unwrap_or("-")
        );
        map.insert(index, entry);
    }

    info!(
        "Built hierarchy map for {} entries (address field: {})",
        map.len(),
        address_column
    );
    map
}

/// Creation order: ascending depth, ties kept in row order.
pub fn sorted_hierarchy_map(map: &HierarchyMap) -> Vec<(usize, &HierarchyEntry)> {
    let mut sorted: Vec<(usize, &HierarchyEntry)> = map.iter().collect();
    sorted.sort_by_key(|(_, entry)| entry.depth());
    sorted
}

/// Display order: each top-level entry followed by its children, depth first.
///
/// Children are matched to parents by slug. Top-level entries and sibling
/// groups keep creation order. A child whose parent slug matches no entry's
/// slug is left out, and every row appears at most once.
pub fn tree_ordered_hierarchy_map(map: &HierarchyMap) -> Vec<(usize, &HierarchyEntry)> {
    let mut top_level = Vec::new();
    let mut by_parent: HashMap<&str, Vec<usize>> = HashMap::new();

    for (index, entry) in sorted_hierarchy_map(map) {
        match entry.path_info.parent_slug.as_deref() {
            Some(parent_slug) if !entry.path_info.is_top_level() => {
                by_parent.entry(parent_slug).or_default().push(index);
            }
            _ => top_level.push(index),
        }
    }

    let mut result = Vec::with_capacity(map.len());
    let mut emitted = HashSet::new();
    push_subtrees(map, &top_level, &by_parent, &mut emitted, &mut result);
    result
}

fn push_subtrees<'m>(
    map: &'m HierarchyMap,
    indexes: &[usize],
    by_parent: &HashMap<&str, Vec<usize>>,
    emitted: &mut HashSet<usize>,
    result: &mut Vec<(usize, &'m HierarchyEntry)>,
) {
    for &index in indexes {
        let Some(entry) = map.get(index) else {
            continue;
        };
        if !emitted.insert(index) {
            continue;
        }
        result.push((index, entry));

        if let Some(children) = by_parent.get(entry.slug.as_str()) {
            push_subtrees(map, children, by_parent, emitted, result);
        }
    }
}

/// Slug to entry id for entries created or found during one run.
#[derive(Debug, Clone, Default)]
pub struct SlugEntryCache {
    entries: HashMap<String, EntryId>,
}

impl SlugEntryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slug: &str) -> Option<EntryId> {
        self.entries.get(slug).copied()
    }

    pub fn insert(&mut self, slug: impl Into<String>, id: EntryId) {
        self.entries.insert(slug.into(), id);
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.entries.contains_key(slug)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Resolves parent entry ids for one import run.
///
/// Create a fresh resolver per run; the cache is never shared between runs.
pub struct HierarchyResolver<'s, S: EntryStore + ?Sized> {
    store: &'s S,
    cache: SlugEntryCache,
}

impl<'s, S: EntryStore + ?Sized> HierarchyResolver<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            cache: SlugEntryCache::new(),
        }
    }

    pub fn cache(&self) -> &SlugEntryCache {
        &self.cache
    }

    /// Parent id for a row, or `None` when the row is top-level, absent from
    /// the map, or its parent slug cannot be found. Never fails: a store
    /// error is logged and treated as "no parent".
    pub fn parent_entry_id_for_row(
        &mut self,
        map: &HierarchyMap,
        row_index: usize,
    ) -> Option<EntryId> {
        let entry = map.get(row_index)?;
        let path_info = &entry.path_info;

        let parent_slug = match path_info.parent_slug.as_deref() {
            Some(parent_slug) if path_info.depth > 1 => parent_slug,
            _ => {
                debug!(
                    "Entry '{}' is top-level (depth: {})",
                    entry.slug, path_info.depth
                );
                return None;
            }
        };

        if let Some(parent_id) = self.cache.get(parent_slug) {
            debug!(
                "Found parent '{}' (ID: {}) for entry '{}'",
                parent_slug, parent_id, entry.slug
            );
            return Some(parent_id);
        }

        debug!("Searching for parent slug '{}' in store", parent_slug);
        match self.store.find_by_slug(parent_slug) {
            Ok(Some(parent)) => {
                self.cache.insert(parent_slug, parent.id);
                info!(
                    "Found existing parent '{}' (ID: {}, section: {}) for entry '{}'",
                    parent_slug, parent.id, parent.section_id, entry.slug
                );
                Some(parent.id)
            }
            Ok(None) => {
                warn!(
                    "Parent entry '{}' not found for entry '{}' - treating as top-level",
                    parent_slug, entry.slug
                );
                None
            }
            Err(e) => {
                warn!(
                    "Lookup of parent '{}' for entry '{}' failed: {} - treating as top-level",
                    parent_slug, entry.slug, e
                );
                None
            }
        }
    }

    /// Make a freshly created entry discoverable as a parent for deeper rows.
    pub fn cache_entry_slug(&mut self, slug: &str, entry_id: EntryId) {
        self.cache.insert(slug, entry_id);
        debug!("Cached entry '{}' with ID: {}", slug, entry_id);
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
        debug!("Cleared hierarchy cache");
    }
}
