use crate::error::StoreError;
use crate::runtime::store::UpsertAdapter;
use crate::runtime::types::{
    DivisionFields, DivisionRef, ParagraphFields, ParagraphKey, ParagraphRef, PersistSummary,
    SectionFields, SectionRef, SubDivisionFields, SubDivisionRef, SupplementaryUnitFields,
    SupplementaryUnitRef,
};
use crate::types::SENTINEL_SECTION_NUMBER;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

// Sections use `scope` so that the placeholder section "-" is unique per
// sub-division while numbered sections are unique per division. Paragraphs
// use `parent_key` (0 for roots) because NULLs never collide in a UNIQUE index.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS divisions (
    id INTEGER PRIMARY KEY,
    number TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    authority TEXT,
    source TEXT,
    ingested_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS subdivisions (
    id INTEGER PRIMARY KEY,
    division_id INTEGER NOT NULL REFERENCES divisions(id),
    code TEXT NOT NULL,
    title TEXT NOT NULL,
    ingested_at TEXT NOT NULL,
    UNIQUE (division_id, code)
);
CREATE TABLE IF NOT EXISTS sections (
    id INTEGER PRIMARY KEY,
    division_id INTEGER NOT NULL REFERENCES divisions(id),
    subdivision_id INTEGER NOT NULL REFERENCES subdivisions(id),
    scope INTEGER NOT NULL,
    number TEXT NOT NULL,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    ingested_at TEXT NOT NULL,
    UNIQUE (division_id, scope, number)
);
CREATE TABLE IF NOT EXISTS paragraphs (
    id INTEGER PRIMARY KEY,
    section_id INTEGER NOT NULL REFERENCES sections(id),
    parent_id INTEGER REFERENCES paragraphs(id),
    parent_key INTEGER NOT NULL,
    label TEXT NOT NULL,
    level INTEGER NOT NULL,
    occurrence INTEGER NOT NULL,
    position INTEGER NOT NULL,
    body TEXT NOT NULL,
    ingested_at TEXT NOT NULL,
    UNIQUE (section_id, parent_key, label, level, occurrence)
);
CREATE TABLE IF NOT EXISTS supplementary_units (
    id INTEGER PRIMARY KEY,
    division_id INTEGER NOT NULL REFERENCES divisions(id),
    number TEXT NOT NULL,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    ingested_at TEXT NOT NULL,
    UNIQUE (division_id, number)
);
CREATE INDEX IF NOT EXISTS idx_sections_subdivision ON sections (subdivision_id);
CREATE INDEX IF NOT EXISTS idx_paragraphs_section ON paragraphs (section_id, position);
";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Backend(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn counts(&self) -> Result<PersistSummary, StoreError> {
        let conn = self.lock()?;
        let count = |table: &str| -> Result<usize, StoreError> {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?;
            Ok(n as usize)
        };
        Ok(PersistSummary {
            divisions: count("divisions")?,
            subdivisions: count("subdivisions")?,
            sections: count("sections")?,
            paragraphs: count("paragraphs")?,
            supplementary_units: count("supplementary_units")?,
        })
    }

    /// Title and body of a stored section, looked up by division and number.
    pub fn section_text(
        &self,
        division: &str,
        number: &str,
    ) -> Result<Option<(String, String)>, StoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT s.title, s.body FROM sections s
                 JOIN divisions d ON d.id = s.division_id
                 WHERE d.number = ?1 AND s.number = ?2
                 ORDER BY s.id LIMIT 1",
                params![division, number],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(row)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Backend(format!("sqlite connection poisoned: {e}")))
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[async_trait]
impl UpsertAdapter for SqliteStore {
    async fn upsert_division(
        &self,
        number: &str,
        fields: &DivisionFields,
    ) -> Result<DivisionRef, StoreError> {
        let conn = self.lock()?;
        let id = conn.query_row(
            "INSERT INTO divisions (number, title, authority, source, ingested_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (number) DO UPDATE SET
                title = excluded.title,
                authority = excluded.authority,
                source = excluded.source,
                ingested_at = excluded.ingested_at
             RETURNING id",
            params![number, fields.title, fields.authority, fields.source, now()],
            |row| row.get(0),
        )?;
        Ok(DivisionRef(id))
    }

    async fn upsert_subdivision(
        &self,
        division: DivisionRef,
        code: &str,
        fields: &SubDivisionFields,
    ) -> Result<SubDivisionRef, StoreError> {
        let conn = self.lock()?;
        let id = conn.query_row(
            "INSERT INTO subdivisions (division_id, code, title, ingested_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (division_id, code) DO UPDATE SET
                title = excluded.title,
                ingested_at = excluded.ingested_at
             RETURNING id",
            params![division.0, code, fields.title, now()],
            |row| row.get(0),
        )?;
        Ok(SubDivisionRef(id))
    }

    async fn upsert_section(
        &self,
        subdivision: SubDivisionRef,
        number: &str,
        fields: &SectionFields,
    ) -> Result<SectionRef, StoreError> {
        let conn = self.lock()?;
        let division: Option<i64> = conn
            .query_row(
                "SELECT division_id FROM subdivisions WHERE id = ?1",
                params![subdivision.0],
                |row| row.get(0),
            )
            .optional()?;
        let Some(division) = division else {
            return Err(StoreError::Backend(format!(
                "unknown subdivision ref {}",
                subdivision.0
            )));
        };

        let scope = if number == SENTINEL_SECTION_NUMBER {
            subdivision.0
        } else {
            0
        };
        let owner: Option<i64> = conn
            .query_row(
                "SELECT subdivision_id FROM sections
                 WHERE division_id = ?1 AND scope = ?2 AND number = ?3",
                params![division, scope, number],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(owner) = owner.filter(|owner| *owner != subdivision.0) {
            return Err(StoreError::Conflict(format!(
                "section {number} already belongs to subdivision ref {owner}"
            )));
        }

        let id = conn.query_row(
            "INSERT INTO sections
                (division_id, subdivision_id, scope, number, title, body, ingested_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (division_id, scope, number) DO UPDATE SET
                title = excluded.title,
                body = excluded.body,
                ingested_at = excluded.ingested_at
             RETURNING id",
            params![
                division,
                subdivision.0,
                scope,
                number,
                fields.title,
                fields.body,
                now()
            ],
            |row| row.get(0),
        )?;
        Ok(SectionRef(id))
    }

    async fn upsert_paragraph(
        &self,
        section: SectionRef,
        key: &ParagraphKey,
        fields: &ParagraphFields,
    ) -> Result<ParagraphRef, StoreError> {
        let conn = self.lock()?;
        if let Some(parent) = key.parent {
            let parent_section: Option<i64> = conn
                .query_row(
                    "SELECT section_id FROM paragraphs WHERE id = ?1",
                    params![parent.0],
                    |row| row.get(0),
                )
                .optional()?;
            match parent_section {
                None => {
                    return Err(StoreError::Backend(format!(
                        "unknown paragraph ref {}",
                        parent.0
                    )))
                }
                Some(owner) if owner != section.0 => {
                    return Err(StoreError::Conflict(format!(
                        "parent paragraph {} belongs to section ref {owner}, not {}",
                        parent.0, section.0
                    )))
                }
                Some(_) => {}
            }
        }

        let parent_id = key.parent.map(|parent| parent.0);
        let id = conn.query_row(
            "INSERT INTO paragraphs
                (section_id, parent_id, parent_key, label, level, occurrence, position, body, ingested_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT (section_id, parent_key, label, level, occurrence) DO UPDATE SET
                position = excluded.position,
                body = excluded.body,
                ingested_at = excluded.ingested_at
             RETURNING id",
            params![
                section.0,
                parent_id,
                parent_id.unwrap_or(0),
                key.label,
                key.level,
                key.occurrence,
                fields.position,
                fields.body,
                now()
            ],
            |row| row.get(0),
        )?;
        Ok(ParagraphRef(id))
    }

    async fn upsert_supplementary_unit(
        &self,
        division: DivisionRef,
        number: &str,
        fields: &SupplementaryUnitFields,
    ) -> Result<SupplementaryUnitRef, StoreError> {
        let conn = self.lock()?;
        let id = conn.query_row(
            "INSERT INTO supplementary_units (division_id, number, title, body, ingested_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (division_id, number) DO UPDATE SET
                title = excluded.title,
                body = excluded.body,
                ingested_at = excluded.ingested_at
             RETURNING id",
            params![division.0, number, fields.title, fields.body, now()],
            |row| row.get(0),
        )?;
        Ok(SupplementaryUnitRef(id))
    }
}
