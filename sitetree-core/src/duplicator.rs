use crate::entry::{Entry, EntryId, HEADING_FIELD, SEO_FIELD, slugify};
use crate::error::{Result, SiteTreeError};
use crate::mapping::{FieldMappings, MappingTarget};
use crate::store::EntryStore;
use regex::{NoExpand, Regex};
use serde::Serialize;
use serde_json::{Map, Value};
use sitetree_csv::Row;
use std::sync::LazyLock;
use tracing::{debug, info};

static TEXT_NODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">([^<]+)<").expect("text node pattern is valid"));

const GLOBAL_VARS: &str = "metaGlobalVars";
const BUNDLE_SETTINGS: &str = "metaBundleSettings";
const FROM_CUSTOM: &str = "fromCustom";

/// What an entry would look like if the row were imported.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPreview {
    /// 1-based data row number.
    pub row: usize,
    pub title: String,
    pub slug: String,
    pub heading: String,
    pub seo_description: String,
    pub depth: usize,
    pub parent_slug: Option<String>,
    pub url: Option<String>,
    /// Explicit parent chosen for rows without a CSV-derived parent.
    pub parent_id: Option<EntryId>,
}

/// Copies a template entry and overrides it with a CSV row's mapped values.
pub struct EntryDuplicator<'s, S: EntryStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: EntryStore + ?Sized> EntryDuplicator<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Create and save a new entry from the template and row.
    pub fn duplicate_and_populate(
        &self,
        template: &Entry,
        row: &Row,
        mappings: &FieldMappings,
        parent_id: Option<EntryId>,
    ) -> Result<EntryId> {
        let template_id = template.id.ok_or(SiteTreeError::TemplateNotFound)?;
        let mut entry = self.store.duplicate_template(template_id)?;

        if let Some(parent_id) = parent_id {
            entry.parent_id = Some(parent_id);
            debug!("Setting parent entry ID: {}", parent_id);
        }

        apply_field_mappings(&mut entry, row, mappings);
        apply_seo_settings(&mut entry, row, mappings);

        let id = self.store.save_entry(&entry)?;
        info!("Created entry '{}' (ID: {})", entry.slug, id);
        Ok(id)
    }

    /// Build the entry in memory only.
    pub fn create_preview(
        &self,
        template: &Entry,
        row: &Row,
        mappings: &FieldMappings,
    ) -> Result<EntryPreview> {
        let mut entry = Entry::from_template(template);
        apply_field_mappings(&mut entry, row, mappings);
        apply_seo_settings(&mut entry, row, mappings);

        if entry.title.trim().is_empty() {
            return Err(SiteTreeError::Validation("Title cannot be blank".to_string()));
        }
        if entry.slug.is_empty() {
            entry.slug = slugify(&entry.title);
        }

        Ok(EntryPreview {
            seo_description: seo_description(&entry, row, mappings),
            heading: entry.field_str(HEADING_FIELD).unwrap_or_default().to_string(),
            title: entry.title,
            slug: entry.slug,
            ..Default::default()
        })
    }
}

/// Apply every mapping whose column is present in the row.
pub fn apply_field_mappings(entry: &mut Entry, row: &Row, mappings: &FieldMappings) {
    for mapping in mappings.iter() {
        let Some(value) = row.get(&mapping.column) else {
            continue;
        };

        match &mapping.target {
            MappingTarget::HierarchyAddress => {}
            MappingTarget::Slug => entry.slug = slugify(value),
            MappingTarget::Title => entry.title = value.to_string(),
            MappingTarget::Heading => {
                let html = render_heading(entry.field_str(HEADING_FIELD), value);
                debug!("Set heading: {}", html);
                entry.set_field(HEADING_FIELD, Value::String(html));
            }
            // Handled by apply_seo_settings.
            MappingTarget::SeoTitle | MappingTarget::SeoDescription => {}
            MappingTarget::Unknown(id) => debug!("Ignoring unknown target '{}'", id),
        }
    }
}

pub fn apply_seo_settings(entry: &mut Entry, row: &Row, mappings: &FieldMappings) {
    for mapping in mappings.iter() {
        let Some(value) = row.get(&mapping.column) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }

        match mapping.target {
            MappingTarget::SeoTitle => {
                set_seo_var(entry, "seoTitle", "seoTitleSource", value);
            }
            MappingTarget::SeoDescription => {
                set_seo_var(entry, "seoDescription", "seoDescriptionSource", value);
            }
            _ => {}
        }
    }
}

/// Replace the template heading's text nodes with `text`, or wrap it in an
/// `<h1>` when there is nothing to replace.
pub fn render_heading(existing: Option<&str>, text: &str) -> String {
    let escaped = escape_html(text);

    match existing {
        Some(html) if !html.trim().is_empty() && TEXT_NODE.is_match(html) => TEXT_NODE
            .replace_all(html, NoExpand(&format!(">{}<", escaped)))
            .into_owned(),
        _ => format!("<h1>{}</h1>", escaped),
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn object_at<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let slot = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(inner) => inner,
        _ => unreachable!("slot was just made an object"),
    }
}

fn set_seo_var(entry: &mut Entry, var: &str, source: &str, value: &str) {
    let mut seo = match entry.fields.remove(SEO_FIELD) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };

    object_at(&mut seo, GLOBAL_VARS).insert(var.to_string(), Value::String(value.to_string()));
    object_at(&mut seo, BUNDLE_SETTINGS)
        .insert(source.to_string(), Value::String(FROM_CUSTOM.to_string()));

    debug!("Set SEO {}: {}", var, value);
    entry.set_field(SEO_FIELD, Value::Object(seo));
}

/// The mapped description cell, else the entry's stored SEO description.
fn seo_description(entry: &Entry, row: &Row, mappings: &FieldMappings) -> String {
    if let Some(value) = mappings
        .iter()
        .filter(|m| m.target == MappingTarget::SeoDescription)
        .find_map(|m| row.get(&m.column))
    {
        return value.to_string();
    }

    entry
        .field(SEO_FIELD)
        .and_then(|seo| seo.get(GLOBAL_VARS))
        .and_then(|vars| vars.get("seoDescription"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{EntryRef, Section};
    use serde_json::json;
    use std::cell::RefCell;

    struct TemplateStore {
        template: Entry,
        saved: RefCell<Vec<Entry>>,
    }

    impl EntryStore for TemplateStore {
        fn find_by_slug(&self, _slug: &str) -> Result<Option<EntryRef>> {
            Ok(None)
        }

        fn get_entry(&self, id: EntryId) -> Result<Option<Entry>> {
            Ok((self.template.id == Some(id)).then(|| self.template.clone()))
        }

        fn get_section(&self, _id: i64) -> Result<Option<Section>> {
            Ok(None)
        }

        fn save_entry(&self, entry: &Entry) -> Result<EntryId> {
            let mut saved = self.saved.borrow_mut();
            saved.push(entry.clone());
            Ok(100 + saved.len() as EntryId)
        }
    }

    fn template() -> Entry {
        let mut template = Entry::new(2)
            .with_title("Template")
            .with_slug("template")
            .with_field(HEADING_FIELD, json!("<div class=\"hero\"><h1>Placeholder</h1></div>"))
            .with_field("body", json!("Shared body copy"))
            .with_field(
                SEO_FIELD,
                json!({
                    "metaGlobalVars": {"seoDescription": "Template description", "robots": "all"}
                }),
            );
        template.id = Some(1);
        template
    }

    fn full_mappings() -> FieldMappings {
        FieldMappings::new()
            .with("Address", MappingTarget::HierarchyAddress)
            .with("Slug", MappingTarget::Slug)
            .with("Page Title", MappingTarget::Title)
            .with("H1", MappingTarget::Heading)
            .with("Meta Title", MappingTarget::SeoTitle)
            .with("Meta Description", MappingTarget::SeoDescription)
            .with("Colour", MappingTarget::Unknown("entry.colour".into()))
    }

    fn full_row() -> Row {
        Row::from_pairs([
            ("Address", "https://example.com/about/team"),
            ("Slug", "Our Team"),
            ("Page Title", "Meet the Team"),
            ("H1", "Team & Friends"),
            ("Meta Title", "Team | Example"),
            ("Meta Description", "The people behind Example"),
            ("Colour", "blue"),
        ])
    }

    #[test]
    fn heading_replaces_text_nodes() {
        let html = render_heading(Some("<div><h1>Old</h1><p>Also old</p></div>"), "New");
        assert_eq!(html, "<div><h1>New</h1><p>New</p></div>");
    }

    #[test]
    fn heading_falls_back_to_h1() {
        assert_eq!(render_heading(None, "Hi"), "<h1>Hi</h1>");
        assert_eq!(render_heading(Some("   "), "Hi"), "<h1>Hi</h1>");
        assert_eq!(render_heading(Some("<hr/>"), "Hi"), "<h1>Hi</h1>");
    }

    #[test]
    fn heading_keeps_markup_when_text_is_unchanged() {
        let html = render_heading(Some("<h2 class=\"x\">Same</h2>"), "Same");
        assert_eq!(html, "<h2 class=\"x\">Same</h2>");
    }

    #[test]
    fn heading_value_is_escaped_literally() {
        let html = render_heading(Some("<h1>x</h1>"), "$1 <b>\"A\" & 'B'</b>");
        assert_eq!(
            html,
            "<h1>$1 &lt;b&gt;&quot;A&quot; &amp; &apos;B&apos;&lt;/b&gt;</h1>"
        );
    }

    #[test]
    fn mappings_populate_entry() {
        let mut entry = Entry::from_template(&template());
        apply_field_mappings(&mut entry, &full_row(), &full_mappings());
        apply_seo_settings(&mut entry, &full_row(), &full_mappings());

        assert_eq!(entry.slug, "our-team");
        assert_eq!(entry.title, "Meet the Team");
        assert_eq!(
            entry.field_str(HEADING_FIELD),
            Some("<div class=\"hero\"><h1>Team &amp; Friends</h1></div>")
        );
        assert_eq!(entry.field_str("body"), Some("Shared body copy"));

        let seo = entry.field(SEO_FIELD).unwrap();
        assert_eq!(seo["metaGlobalVars"]["seoTitle"], "Team | Example");
        assert_eq!(seo["metaGlobalVars"]["seoDescription"], "The people behind Example");
        assert_eq!(seo["metaGlobalVars"]["robots"], "all");
        assert_eq!(seo["metaBundleSettings"]["seoDescriptionSource"], "fromCustom");
        assert_eq!(seo["metaBundleSettings"]["seoTitleSource"], "fromCustom");
        assert!(entry.field("colour").is_none());
    }

    #[test]
    fn empty_seo_cell_leaves_template_value() {
        let mut entry = Entry::from_template(&template());
        let row = Row::from_pairs([("Meta Description", "")]);
        apply_seo_settings(&mut entry, &row, &full_mappings());

        let seo = entry.field(SEO_FIELD).unwrap();
        assert_eq!(seo["metaGlobalVars"]["seoDescription"], "Template description");
        assert!(seo.get("metaBundleSettings").is_none());
    }

    #[test]
    fn missing_cells_are_skipped() {
        let mut entry = Entry::from_template(&template());
        let row = Row::from_pairs([("Page Title", "Only a title")]);
        apply_field_mappings(&mut entry, &row, &full_mappings());

        assert_eq!(entry.title, "Only a title");
        assert!(entry.slug.is_empty());
        assert_eq!(
            entry.field_str(HEADING_FIELD),
            Some("<div class=\"hero\"><h1>Placeholder</h1></div>")
        );
    }

    #[test]
    fn preview_uses_template_description_when_unmapped() {
        let store = TemplateStore {
            template: template(),
            saved: RefCell::new(Vec::new()),
        };
        let duplicator = EntryDuplicator::new(&store);
        let mappings = FieldMappings::new().with("Page Title", MappingTarget::Title);
        let row = Row::from_pairs([("Page Title", "Contact Us")]);

        let preview = duplicator.create_preview(&store.template, &row, &mappings).unwrap();
        assert_eq!(preview.title, "Contact Us");
        assert_eq!(preview.slug, "contact-us");
        assert_eq!(preview.seo_description, "Template description");
        assert!(store.saved.borrow().is_empty());
    }

    #[test]
    fn preview_rejects_blank_title() {
        let store = TemplateStore {
            template: template(),
            saved: RefCell::new(Vec::new()),
        };
        let duplicator = EntryDuplicator::new(&store);
        let row = Row::from_pairs([("Slug", "no-title")]);

        let result = duplicator.create_preview(&store.template, &row, &full_mappings());
        assert!(matches!(result, Err(SiteTreeError::Validation(_))));
    }

    #[test]
    fn duplicate_saves_with_parent() {
        let store = TemplateStore {
            template: template(),
            saved: RefCell::new(Vec::new()),
        };
        let duplicator = EntryDuplicator::new(&store);

        let id = duplicator
            .duplicate_and_populate(&store.template, &full_row(), &full_mappings(), Some(55))
            .unwrap();
        assert_eq!(id, 101);

        let saved = store.saved.borrow();
        assert_eq!(saved[0].parent_id, Some(55));
        assert_eq!(saved[0].section_id, 2);
        assert_eq!(saved[0].id, None);
        assert_eq!(saved[0].slug, "our-team");
    }

    #[test]
    fn duplicate_requires_saved_template() {
        let store = TemplateStore {
            template: template(),
            saved: RefCell::new(Vec::new()),
        };
        let duplicator = EntryDuplicator::new(&store);
        let unsaved = Entry::new(2).with_title("Draft");

        let result =
            duplicator.duplicate_and_populate(&unsaved, &full_row(), &full_mappings(), None);
        assert!(matches!(result, Err(SiteTreeError::TemplateNotFound)));
    }
}
