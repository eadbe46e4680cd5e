use crate::entry::{Entry, EntryId, EntryRef, Section, slugify};
use crate::error::{Result, SiteTreeError};
use crate::store::EntryStore;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

const ENTRY_COLUMNS: &str = "id, uid, section_id, parent_id, slug, title, enabled, fields";

fn entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(Entry, String)> {
    Ok((
        Entry {
            id: Some(row.get(0)?),
            uid: row.get(1)?,
            section_id: row.get(2)?,
            parent_id: row.get(3)?,
            slug: row.get(4)?,
            title: row.get(5)?,
            enabled: row.get(6)?,
            fields: BTreeMap::new(),
        },
        row.get(7)?,
    ))
}

fn with_fields((mut entry, fields): (Entry, String)) -> Result<Entry> {
    entry.fields = serde_json::from_str(&fields)?;
    Ok(entry)
}

impl Database {
    pub fn drop(path: &Path) -> std::io::Result<()> {
        fs::remove_file(path)
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
CREATE TABLE IF NOT EXISTS sections (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    handle TEXT UNIQUE NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uid TEXT UNIQUE NOT NULL,
    section_id INTEGER NOT NULL,
    parent_id INTEGER,
    slug TEXT NOT NULL,
    title TEXT NOT NULL,
    enabled BOOLEAN NOT NULL DEFAULT 1,
    fields TEXT NOT NULL DEFAULT '{}',  -- JSON object keyed by field handle
    date_created INTEGER NOT NULL,
    date_updated INTEGER NOT NULL,

    FOREIGN KEY(section_id) REFERENCES sections(id) ON DELETE CASCADE,
    FOREIGN KEY(parent_id) REFERENCES entries(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_entries_slug ON entries(slug);
CREATE INDEX IF NOT EXISTS idx_entries_section ON entries(section_id);
CREATE INDEX IF NOT EXISTS idx_entries_parent ON entries(parent_id);
            ",
        )?;
        Ok(())
    }

    // Section management
    pub fn create_section(&self, name: &str, handle: &str) -> Result<Section> {
        let handle = if handle.is_empty() {
            slugify(name)
        } else {
            handle.to_string()
        };
        if name.trim().is_empty() || handle.is_empty() {
            return Err(SiteTreeError::Validation(
                "Section name cannot be blank".to_string(),
            ));
        }

        self.conn.execute(
            "INSERT INTO sections (name, handle, created_at) VALUES (?1, ?2, ?3)",
            params![name, &handle, current_timestamp()],
        )?;

        Ok(Section {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            handle,
        })
    }

    pub fn list_sections(&self) -> Result<Vec<Section>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, handle FROM sections ORDER BY id")?;

        let sections = stmt
            .query_map([], |row| {
                Ok(Section {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    handle: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(sections)
    }

    // Entry queries
    pub fn list_entries(&self, section_id: i64) -> Result<Vec<Entry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM entries WHERE section_id = ?1 ORDER BY id",
            ENTRY_COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![section_id], entry_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(with_fields).collect()
    }

    pub fn count_entries(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(count)
    }

    fn validate(&self, entry: &Entry) -> Result<Entry> {
        let mut entry = entry.clone();

        if entry.title.trim().is_empty() {
            return Err(SiteTreeError::Validation("Title cannot be blank".to_string()));
        }
        if entry.slug.trim().is_empty() {
            entry.slug = slugify(&entry.title);
        }
        if entry.slug.is_empty() {
            return Err(SiteTreeError::Validation("Slug cannot be blank".to_string()));
        }

        if self.get_section(entry.section_id)?.is_none() {
            return Err(SiteTreeError::SectionNotFound(entry.section_id));
        }

        if let Some(parent_id) = entry.parent_id {
            if Some(parent_id) == entry.id {
                return Err(SiteTreeError::Validation(
                    "An entry cannot be its own parent".to_string(),
                ));
            }
            let parent = self
                .get_entry(parent_id)?
                .ok_or_else(|| {
                    SiteTreeError::Validation(format!("Parent entry {} does not exist", parent_id))
                })?;
            if parent.section_id != entry.section_id {
                return Err(SiteTreeError::Validation(format!(
                    "Parent entry {} belongs to a different section",
                    parent_id
                )));
            }
        }

        Ok(entry)
    }

    pub fn get_connection(&self) -> &Connection {
        &self.conn
    }
}

impl EntryStore for Database {
    fn find_by_slug(&self, slug: &str) -> Result<Option<EntryRef>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, section_id FROM entries WHERE slug = ?1 ORDER BY id LIMIT 1")?;

        let result = stmt
            .query_row(params![slug], |row| {
                Ok(EntryRef {
                    id: row.get(0)?,
                    section_id: row.get(1)?,
                })
            })
            .optional()?;
        Ok(result)
    }

    fn get_entry(&self, id: EntryId) -> Result<Option<Entry>> {
        let mut stmt =
            self.conn.prepare(&format!("SELECT {} FROM entries WHERE id = ?1", ENTRY_COLUMNS))?;

        let row = stmt.query_row(params![id], entry_from_row).optional()?;
        row.map(with_fields).transpose()
    }

    fn get_section(&self, id: i64) -> Result<Option<Section>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, handle FROM sections WHERE id = ?1")?;

        let section = stmt
            .query_row(params![id], |row| {
                Ok(Section {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    handle: row.get(2)?,
                })
            })
            .optional()?;
        Ok(section)
    }

    fn save_entry(&self, entry: &Entry) -> Result<EntryId> {
        let entry = self.validate(entry)?;
        let fields = serde_json::to_string(&entry.fields)?;
        let timestamp = current_timestamp();

        match entry.id {
            Some(id) => {
                let changed = self.conn.execute(
                    "UPDATE entries SET section_id = ?1, parent_id = ?2, slug = ?3, title = ?4,
                        enabled = ?5, fields = ?6, date_updated = ?7 WHERE id = ?8",
                    params![
                        entry.section_id,
                        entry.parent_id,
                        &entry.slug,
                        &entry.title,
                        entry.enabled,
                        &fields,
                        timestamp,
                        id,
                    ],
                )?;
                if changed == 0 {
                    return Err(SiteTreeError::EntryNotFound(id));
                }
                debug!("Updated entry '{}' (ID: {})", entry.slug, id);
                Ok(id)
            }
            None => {
                let uid = entry
                    .uid
                    .clone()
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                self.conn.execute(
                    "INSERT INTO entries (
                        uid, section_id, parent_id, slug, title, enabled, fields,
                        date_created, date_updated
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        &uid,
                        entry.section_id,
                        entry.parent_id,
                        &entry.slug,
                        &entry.title,
                        entry.enabled,
                        &fields,
                        timestamp,
                        timestamp,
                    ],
                )?;
                let id = self.conn.last_insert_rowid();
                debug!("Inserted entry '{}' (ID: {})", entry.slug, id);
                Ok(id)
            }
        }
    }
}
