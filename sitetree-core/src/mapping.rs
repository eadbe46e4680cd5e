use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{Result, SiteTreeError};

/// Where a CSV column's value goes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MappingTarget {
    /// Source URL used only for depth and parent inference.
    HierarchyAddress,
    Slug,
    Title,
    /// Rich-text heading field.
    Heading,
    SeoTitle,
    SeoDescription,
    Unknown(String),
}

impl MappingTarget {
    pub fn from_id(id: &str) -> Self {
        match id.trim() {
            "hierarchy.address" => MappingTarget::HierarchyAddress,
            "entry.slug" => MappingTarget::Slug,
            "entry.title" => MappingTarget::Title,
            "entry.heading" => MappingTarget::Heading,
            "seo.title" => MappingTarget::SeoTitle,
            "seo.description" => MappingTarget::SeoDescription,
            other => MappingTarget::Unknown(other.to_string()),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            MappingTarget::HierarchyAddress => "hierarchy.address",
            MappingTarget::Slug => "entry.slug",
            MappingTarget::Title => "entry.title",
            MappingTarget::Heading => "entry.heading",
            MappingTarget::SeoTitle => "seo.title",
            MappingTarget::SeoDescription => "seo.description",
            MappingTarget::Unknown(id) => id.as_str(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            MappingTarget::HierarchyAddress => "Hierarchy Address",
            MappingTarget::Slug => "Entry Slug",
            MappingTarget::Title => "Entry Title",
            MappingTarget::Heading => "Hero Heading",
            MappingTarget::SeoTitle => "SEO Meta Title",
            MappingTarget::SeoDescription => "SEO Meta Description",
            MappingTarget::Unknown(id) => id.as_str(),
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, MappingTarget::Slug | MappingTarget::Title)
    }

    /// Every target a column can be mapped to.
    pub fn available() -> [MappingTarget; 6] {
        [
            MappingTarget::HierarchyAddress,
            MappingTarget::Slug,
            MappingTarget::Title,
            MappingTarget::Heading,
            MappingTarget::SeoTitle,
            MappingTarget::SeoDescription,
        ]
    }
}

impl fmt::Display for MappingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub column: String,
    pub target: MappingTarget,
}

#[derive(Debug, Deserialize, Serialize)]
struct MappingSpec {
    column: String,
    target: String,
}

/// Ordered CSV column to target assignments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMappings {
    mappings: Vec<FieldMapping>,
}

impl FieldMappings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, target: MappingTarget) -> Self {
        self.push(column, target);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, target: MappingTarget) {
        self.mappings.push(FieldMapping {
            column: column.into(),
            target,
        });
    }

    /// Parses `column=target` pairs. The column may itself contain `=`;
    /// the last one separates the target.
    pub fn from_pairs<S: AsRef<str>>(pairs: &[S]) -> Result<Self> {
        let mut mappings = FieldMappings::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (column, target) = pair.rsplit_once('=').ok_or_else(|| {
                SiteTreeError::Validation(format!(
                    "Mapping '{}' must look like COLUMN=TARGET",
                    pair
                ))
            })?;
            let column = column.trim();
            if column.is_empty() {
                return Err(SiteTreeError::Validation(format!(
                    "Mapping '{}' has an empty column name",
                    pair
                )));
            }
            mappings.push(column, MappingTarget::from_id(target));
        }
        Ok(mappings)
    }

    /// Reads `[{"column": "...", "target": "..."}]`.
    pub fn from_json(json: &str) -> Result<Self> {
        let specs: Vec<MappingSpec> = serde_json::from_str(json)?;
        Ok(FieldMappings {
            mappings: specs
                .into_iter()
                .map(|s| FieldMapping {
                    column: s.column,
                    target: MappingTarget::from_id(&s.target),
                })
                .collect(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String> {
        let specs: Vec<MappingSpec> = self
            .mappings
            .iter()
            .map(|m| MappingSpec {
                column: m.column.clone(),
                target: m.target.id().to_string(),
            })
            .collect();
        Ok(serde_json::to_string_pretty(&specs)?)
    }

    pub fn extend(&mut self, other: FieldMappings) {
        self.mappings.extend(other.mappings);
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldMapping> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// First column mapped to `target`.
    pub fn column_for(&self, target: &MappingTarget) -> Option<&str> {
        self.mappings
            .iter()
            .find(|m| &m.target == target)
            .map(|m| m.column.as_str())
    }

    /// The column carrying each row's source URL: explicitly mapped to the
    /// hierarchy address, or literally named `address`.
    pub fn address_column(&self) -> Option<&str> {
        self.mappings
            .iter()
            .find(|m| {
                m.target == MappingTarget::HierarchyAddress
                    || m.column.eq_ignore_ascii_case("address")
            })
            .map(|m| m.column.as_str())
    }

    pub fn slug_column(&self) -> Option<&str> {
        self.column_for(&MappingTarget::Slug)
    }

    /// Problems with this configuration. None of them stop an import.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for mapping in &self.mappings {
            if let MappingTarget::Unknown(id) = &mapping.target {
                errors.push(format!("Invalid target field: {}", id));
            }
        }

        for target in MappingTarget::available() {
            if target.is_required() && self.column_for(&target).is_none() {
                errors.push(format!("Required field not mapped: {}", target.label()));
            }
        }

        errors
    }
}
