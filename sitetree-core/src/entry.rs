use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub type EntryId = i64;

/// Field handle holding the rich-text heading HTML.
pub const HEADING_FIELD: &str = "heading";

/// Field handle holding SEO metadata (`metaGlobalVars`, `metaBundleSettings`).
pub const SEO_FIELD: &str = "seo";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: i64,
    pub name: String,
    pub handle: String,
}

/// What a slug lookup returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRef {
    pub id: EntryId,
    pub section_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: Option<EntryId>,
    pub uid: Option<String>,
    pub section_id: i64,
    pub parent_id: Option<EntryId>,
    pub slug: String,
    pub title: String,
    pub enabled: bool,
    pub fields: BTreeMap<String, Value>,
}

impl Entry {
    pub fn new(section_id: i64) -> Self {
        Self {
            id: None,
            uid: None,
            section_id,
            parent_id: None,
            slug: String::new(),
            title: String::new(),
            enabled: true,
            fields: BTreeMap::new(),
        }
    }

    /// Unsaved copy of a template: same section, every non-null field value,
    /// enabled, no parent, no title or slug.
    pub fn from_template(template: &Entry) -> Self {
        let mut entry = Entry::new(template.section_id);
        entry.fields = template
            .fields
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entry
    }

    pub fn field(&self, handle: &str) -> Option<&Value> {
        self.fields.get(handle)
    }

    pub fn field_str(&self, handle: &str) -> Option<&str> {
        self.fields.get(handle).and_then(Value::as_str)
    }

    pub fn set_field(&mut self, handle: impl Into<String>, value: Value) {
        self.fields.insert(handle.into(), value);
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn with_parent(mut self, parent_id: Option<EntryId>) -> Self {
        self.parent_id = parent_id;
        self
    }

    pub fn with_field(mut self, handle: impl Into<String>, value: Value) -> Self {
        self.set_field(handle, value);
        self
    }
}

/// Lowercase ASCII alphanumerics; any other run of characters collapses to
/// a single `-`, never leading or trailing.
pub fn slugify(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut last_was_separator = false;

    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
            last_was_separator = false;
        } else if !last_was_separator && !result.is_empty() {
            result.push('-');
            last_was_separator = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}
