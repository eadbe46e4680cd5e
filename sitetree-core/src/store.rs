use crate::entry::{Entry, EntryId, EntryRef, Section};
use crate::error::{Result, SiteTreeError};

/// The content store the import core talks to.
///
/// Everything that persists or looks up entries goes through this trait, so
/// the resolver and drivers run against an in-memory fake in tests.
pub trait EntryStore {
    /// First entry (lowest id) with this slug, whatever its status or section.
    fn find_by_slug(&self, slug: &str) -> Result<Option<EntryRef>>;

    fn get_entry(&self, id: EntryId) -> Result<Option<Entry>>;

    fn get_section(&self, id: i64) -> Result<Option<Section>>;

    /// Validates and persists `entry`, inserting when it has no id.
    fn save_entry(&self, entry: &Entry) -> Result<EntryId>;

    /// Unsaved copy of the template entry, ready to be populated.
    fn duplicate_template(&self, template_id: EntryId) -> Result<Entry> {
        let template = self
            .get_entry(template_id)?
            .ok_or(SiteTreeError::TemplateNotFound)?;
        Ok(Entry::from_template(&template))
    }
}

