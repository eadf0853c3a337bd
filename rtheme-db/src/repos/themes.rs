//! Repository for theme records

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use rtheme_core::store::ThemeStore;
use rtheme_core::theme::{Field, FieldStore, RemoteOrigin, Target, Theme, ThemeFields};

use crate::{Database, Error, Result};

/// Repository for themes, their remote origin and their fields
///
/// Every write touches all three tables inside one transaction.
pub struct ThemeRepository<'a> {
    db: &'a Database,
}

impl<'a> ThemeRepository<'a> {
    /// Create a new repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a new theme and return its id
    pub fn insert(&self, theme: &Theme) -> Result<i64> {
        let mut conn = self.db.connection()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO themes (name, user_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                theme.name,
                theme.user_id,
                theme.created_at.to_rfc3339(),
                theme.updated_at.to_rfc3339(),
            ],
        )?;
        let id = tx.last_insert_rowid();

        write_remote(&tx, id, theme.remote.as_ref())?;
        write_fields(&tx, id, &theme.fields)?;
        tx.commit()?;

        Ok(id)
    }

    /// Replace a persisted theme
    ///
    /// The stored remote URL is never rewritten.
    pub fn update(&self, theme: &Theme) -> Result<()> {
        let id = theme
            .id
            .ok_or_else(|| Error::InvalidData("Theme has no ID".to_string()))?;

        let mut conn = self.db.connection()?;
        let tx = conn.transaction()?;

        let affected = tx.execute(
            "UPDATE themes SET name = ?1, user_id = ?2, updated_at = ?3 WHERE id = ?4",
            params![theme.name, theme.user_id, theme.updated_at.to_rfc3339(), id],
        )?;

        if affected == 0 {
            return Err(Error::NotFound(format!("Theme with id {} not found", id)));
        }

        write_remote(&tx, id, theme.remote.as_ref())?;
        tx.execute("DELETE FROM theme_fields WHERE theme_id = ?1", params![id])?;
        write_fields(&tx, id, &theme.fields)?;
        tx.commit()?;

        Ok(())
    }

    /// Find a theme by ID
    pub fn find_by_id(&self, id: i64) -> Result<Option<Theme>> {
        let conn = self.db.connection()?;

        let theme = conn
            .query_row(
                "SELECT id, name, user_id, created_at, updated_at FROM themes WHERE id = ?1",
                params![id],
                |row| Ok(ThemeRow::from_row(row)),
            )
            .optional()?;

        match theme {
            Some(row) => Ok(Some(load_theme(&conn, row?)?)),
            None => Ok(None),
        }
    }

    /// Find all themes, ordered by id
    pub fn find_all(&self) -> Result<Vec<Theme>> {
        let conn = self.db.connection()?;
        let mut stmt = conn
            .prepare("SELECT id, name, user_id, created_at, updated_at FROM themes ORDER BY id")?;

        let rows = stmt
            .query_map([], |row| Ok(ThemeRow::from_row(row)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|row| load_theme(&conn, row?))
            .collect()
    }

    /// Delete a theme and everything attached to it
    pub fn delete(&self, id: i64) -> Result<()> {
        let conn = self.db.connection()?;
        let affected = conn.execute("DELETE FROM themes WHERE id = ?1", params![id])?;

        if affected == 0 {
            return Err(Error::NotFound(format!("Theme with id {} not found", id)));
        }

        Ok(())
    }
}

impl ThemeStore for ThemeRepository<'_> {
    fn insert(&self, theme: &Theme) -> rtheme_core::Result<i64> {
        Ok(ThemeRepository::insert(self, theme)?)
    }

    fn update(&self, theme: &Theme) -> rtheme_core::Result<()> {
        Ok(ThemeRepository::update(self, theme)?)
    }

    fn find(&self, id: i64) -> rtheme_core::Result<Option<Theme>> {
        Ok(self.find_by_id(id)?)
    }

    fn list(&self) -> rtheme_core::Result<Vec<Theme>> {
        Ok(self.find_all()?)
    }
}

/// Columns of the `themes` table
struct ThemeRow {
    id: i64,
    name: String,
    user_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ThemeRow {
    fn from_row(row: &Row) -> Result<Self> {
        let created_at: String = row.get(3)?;
        let updated_at: String = row.get(4)?;

        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            user_id: row.get(2)?,
            created_at: parse_timestamp(&created_at, "created_at")?,
            updated_at: parse_timestamp(&updated_at, "updated_at")?,
        })
    }
}

fn load_theme(conn: &Connection, row: ThemeRow) -> Result<Theme> {
    let remote = conn
        .query_row(
            "SELECT remote_url, remote_version, local_version, about_url, license_url,
                    commits_behind, remote_updated_at
             FROM remote_themes WHERE theme_id = ?1",
            params![row.id],
            |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, Option<String>>(1)?,
                    r.get::<_, Option<String>>(2)?,
                    r.get::<_, Option<String>>(3)?,
                    r.get::<_, Option<String>>(4)?,
                    r.get::<_, Option<i64>>(5)?,
                    r.get::<_, Option<String>>(6)?,
                ))
            },
        )
        .optional()?;

    let remote = match remote {
        Some((url, remote_version, local_version, about_url, license_url, behind, updated)) => {
            let updated = updated
                .map(|s| parse_timestamp(&s, "remote_updated_at"))
                .transpose()?;
            Some(RemoteOrigin::restore(
                url,
                remote_version.unwrap_or_default(),
                local_version.unwrap_or_default(),
                about_url,
                license_url,
                behind,
                updated,
            ))
        }
        None => None,
    };

    let mut stmt =
        conn.prepare("SELECT target_id, name, value FROM theme_fields WHERE theme_id = ?1")?;
    let field_rows = stmt
        .query_map(params![row.id], |r| {
            Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?, r.get::<_, String>(2)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut fields = ThemeFields::new();
    for (target_id, name, value) in field_rows {
        let target = Target::from_id(target_id)
            .ok_or_else(|| Error::InvalidData(format!("Unknown target id {}", target_id)))?;
        let field = Field::parse(&name)
            .ok_or_else(|| Error::InvalidData(format!("Unknown field name {}", name)))?;
        fields.set_field(target, field, Some(value));
    }

    Ok(Theme {
        id: Some(row.id),
        name: row.name,
        user_id: row.user_id,
        fields,
        remote,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn write_remote(conn: &Connection, theme_id: i64, remote: Option<&RemoteOrigin>) -> Result<()> {
    let Some(remote) = remote else {
        conn.execute(
            "DELETE FROM remote_themes WHERE theme_id = ?1",
            params![theme_id],
        )?;
        return Ok(());
    };

    conn.execute(
        "INSERT INTO remote_themes (theme_id, remote_url, remote_version, local_version,
                                    about_url, license_url, commits_behind, remote_updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(theme_id) DO UPDATE SET
            remote_version = excluded.remote_version,
            local_version = excluded.local_version,
            about_url = excluded.about_url,
            license_url = excluded.license_url,
            commits_behind = excluded.commits_behind,
            remote_updated_at = excluded.remote_updated_at",
        params![
            theme_id,
            remote.remote_url(),
            remote.remote_revision,
            remote.local_revision,
            remote.about_url,
            remote.license_url,
            remote.commits_behind,
            remote.remote_updated_at.map(|dt| dt.to_rfc3339()),
        ],
    )?;

    Ok(())
}

fn write_fields(conn: &Connection, theme_id: i64, fields: &ThemeFields) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO theme_fields (theme_id, target_id, name, value) VALUES (?1, ?2, ?3, ?4)",
    )?;

    for (target, field, value) in fields.iter() {
        stmt.execute(params![theme_id, target.id(), field.as_str(), value])?;
    }

    Ok(())
}

fn parse_timestamp(value: &str, column: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::InvalidData(format!("Invalid {} timestamp: {}", column, e)))
}
