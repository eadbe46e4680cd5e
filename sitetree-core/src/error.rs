use crate::entry::EntryId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteTreeError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] sitetree_csv::CsvError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Entry {0} not found")]
    EntryNotFound(EntryId),

    #[error("Section {0} not found")]
    SectionNotFound(i64),

    #[error("Template entry not found")]
    TemplateNotFound,

    #[error("Selected Parent Entry not found")]
    ParentNotFound,

    #[error(
        "Parent Entry '{parent_title}' is in section '{parent_section}', but Template Entry \
         '{template_title}' is in section '{template_section}'. They must be in the same section."
    )]
    SectionMismatch {
        parent_title: String,
        parent_section: String,
        template_title: String,
        template_section: String,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SiteTreeError>;
