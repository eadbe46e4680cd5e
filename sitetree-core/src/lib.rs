pub mod data;
pub mod duplicator;
pub mod entry;
pub mod error;
pub mod hierarchy;
pub mod import;
pub mod mapping;
pub mod path;
pub mod report;
pub mod store;

pub use data::Database;
pub use duplicator::{EntryDuplicator, EntryPreview};
pub use entry::{Entry, EntryId, EntryRef, Section};
pub use error::SiteTreeError;
pub use hierarchy::{HierarchyEntry, HierarchyMap, HierarchyResolver, SlugEntryCache};
pub use import::{
    ImportOptions, ImportProgressCallback, ImportResult, ImportTarget, PreviewOptions,
    import_entries, preview_entries, validate_import_target,
};
pub use mapping::{FieldMapping, FieldMappings, MappingTarget};
pub use path::{PathInfo, parse_url_path};
pub use store::EntryStore;
