//! SQLite persistence layer for daily-loop.
//!
//! Holds the three record collections (users, routines, daily logs) plus the
//! settings blob table. The schema is versioned through `PRAGMA user_version`
//! and upgraded by an ordered list of migrations that run, each inside its
//! own transaction, before the store accepts any other operation.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Transaction};

use crate::models::{now_iso, DailyLog, Routine, RoutineKind, User};

/// Latest schema version. `PRAGMA user_version` of an up-to-date database.
pub const SCHEMA_VERSION: i64 = 3;

/// Identity of the user synthesized by the v1→v2 migration for pre-existing
/// single-user data. Fixed so the migration is deterministic.
pub const MIGRATED_USER_ID: &str = "migrated-default-user";
const MIGRATED_USER_NAME: &str = "My Routines";
const MIGRATED_USER_EMOJI: &str = "🙂";

/// Key of the persisted reminder settings blob.
pub const NOTIFICATION_SETTINGS_KEY: &str = "dailyNotificationSettings";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    Serde(serde_json::Error),
    /// Insert with a primary key that already exists.
    DuplicateKey(String),
    /// Lookup or update on an absent key.
    NotFound(String),
    /// Import payload that cannot be parsed into a snapshot.
    InvalidFormat(String),
    /// A multi-collection transaction failed to commit; storage is unchanged.
    TransactionAborted(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Sqlite(e) => write!(f, "sqlite error: {e}"),
            StoreError::Serde(e) => write!(f, "serialization error: {e}"),
            StoreError::DuplicateKey(msg) => write!(f, "duplicate key: {msg}"),
            StoreError::NotFound(msg) => write!(f, "not found: {msg}"),
            StoreError::InvalidFormat(msg) => write!(f, "invalid format: {msg}"),
            StoreError::TransactionAborted(msg) => write!(f, "transaction aborted: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Sqlite(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serde(e)
    }
}

/// Map a failed insert to `DuplicateKey` when the cause is a primary-key
/// constraint, passing other sqlite errors through.
fn insert_error(e: rusqlite::Error, what: impl Into<String>) -> StoreError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == ErrorCode::ConstraintViolation =>
        {
            StoreError::DuplicateKey(what.into())
        }
        _ => StoreError::Sqlite(e),
    }
}

// ---------------------------------------------------------------------------
// Partial updates
// ---------------------------------------------------------------------------

/// Fields of a user that can be edited. Absent fields are left untouched.
#[derive(Debug, Default, Clone)]
pub struct UserPatch {
    pub name: Option<String>,
    pub emoji: Option<String>,
}

/// Editable routine fields. The kind and its target are fixed at creation.
#[derive(Debug, Default, Clone)]
pub struct RoutinePatch {
    pub title: Option<String>,
    pub is_active: Option<bool>,
}

/// Progress fields of a daily log. `updated_at` is always refreshed.
#[derive(Debug, Default, Clone)]
pub struct LogPatch {
    pub done: Option<bool>,
    pub spent_minutes: Option<u32>,
    pub current_count: Option<u32>,
}

// ---------------------------------------------------------------------------
// Store handle
// ---------------------------------------------------------------------------

/// Default database path inside a data directory.
pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join("daily-loop.db")
}

/// Handle to an opened, fully migrated store. Construct one per process (or
/// per test) and pass it to the services; there is no global instance.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create a database at the given path and bring its schema up to
    /// [`SCHEMA_VERSION`]. A migration failure leaves the store unopened.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Currently recorded schema version.
    pub fn schema_version(&self) -> Result<i64, StoreError> {
        let v: i64 = self
            .conn
            .query_row("SELECT user_version FROM pragma_user_version", [], |row| {
                row.get(0)
            })?;
        Ok(v)
    }

    /// Run every operation in `body` atomically: all of them persist or, if
    /// `body` returns an error, none do. The body receives the store itself;
    /// the connection serializes the enclosed operations.
    pub fn in_transaction<T>(
        &self,
        body: impl FnOnce(&Store) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        // Dropping the transaction on the error path rolls everything back.
        let out = body(self)?;
        tx.commit()
            .map_err(|e| StoreError::TransactionAborted(e.to_string()))?;
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Schema migrations
    // -----------------------------------------------------------------------

    /// Apply pending migrations from the recorded version up to
    /// [`SCHEMA_VERSION`], each in its own transaction. Already-applied steps
    /// never re-run.
    fn migrate(&self) -> Result<(), StoreError> {
        let mut version = self.schema_version()?;
        while version < SCHEMA_VERSION {
            let next = version + 1;
            let tx = self.conn.unchecked_transaction()?;
            match next {
                1 => migrate_to_v1(&tx)?,
                2 => migrate_to_v2(&tx)?,
                3 => migrate_to_v3(&tx)?,
                _ => unreachable!("no migration defined for version {next}"),
            }
            tx.execute_batch(&format!("PRAGMA user_version = {next};"))?;
            tx.commit()
                .map_err(|e| StoreError::TransactionAborted(e.to_string()))?;
            version = next;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    pub fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO users (id, name, emoji, sort_order, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![user.id, user.name, user.emoji, user.sort_order, user.created_at],
            )
            .map_err(|e| insert_error(e, format!("user {}", user.id)))?;
        Ok(())
    }

    pub fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, emoji, sort_order, created_at FROM users WHERE id = ?1",
        )?;
        let row = stmt.query_row(params![id], read_user).optional()?;
        Ok(row)
    }

    /// All users, ordered by sort key. Equal sort keys fall back to insertion
    /// order (rowid), which keeps enumeration stable across calls.
    pub fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, emoji, sort_order, created_at
             FROM users ORDER BY sort_order, rowid",
        )?;
        let rows = stmt.query_map([], read_user)?;
        collect(rows)
    }

    /// Sort key for a newly created user: one past the current maximum.
    pub fn next_user_sort_order(&self) -> Result<i64, StoreError> {
        let next: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM users",
            [],
            |row| row.get(0),
        )?;
        Ok(next)
    }

    /// Merge the patch into the stored user. Fails with `NotFound` when the
    /// id is absent; a patch with no fields set still performs the existence
    /// check.
    pub fn update_user(&self, id: &str, patch: &UserPatch) -> Result<(), StoreError> {
        let mut sets: Vec<&str> = Vec::new();
        let mut binds: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        if let Some(name) = &patch.name {
            sets.push("name = ?");
            binds.push(Box::new(name.clone()));
        }
        if let Some(emoji) = &patch.emoji {
            sets.push("emoji = ?");
            binds.push(Box::new(emoji.clone()));
        }
        if sets.is_empty() {
            return match self.get_user(id)? {
                Some(_) => Ok(()),
                None => Err(StoreError::NotFound(format!("user {id}"))),
            };
        }
        let sql = format!("UPDATE users SET {} WHERE id = ?", sets.join(", "));
        binds.push(Box::new(id.to_string()));
        let bind_refs: Vec<&dyn rusqlite::types::ToSql> =
            binds.iter().map(|b| b.as_ref()).collect();
        let affected = self.conn.execute(&sql, bind_refs.as_slice())?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("user {id}")));
        }
        Ok(())
    }

    pub fn set_user_sort_order(&self, id: &str, sort_order: i64) -> Result<(), StoreError> {
        let affected = self.conn.execute(
            "UPDATE users SET sort_order = ?1 WHERE id = ?2",
            params![sort_order, id],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("user {id}")));
        }
        Ok(())
    }

    /// Delete a user together with all owned routines and logs, atomically.
    /// A no-op when the id is absent.
    pub fn delete_user_cascade(&self, id: &str) -> Result<(), StoreError> {
        self.in_transaction(|store| {
            store
                .conn
                .execute("DELETE FROM daily_logs WHERE user_id = ?1", params![id])?;
            store
                .conn
                .execute("DELETE FROM routines WHERE user_id = ?1", params![id])?;
            store
                .conn
                .execute("DELETE FROM users WHERE id = ?1", params![id])?;
            Ok(())
        })
    }

    // -----------------------------------------------------------------------
    // Routines
    // -----------------------------------------------------------------------

    pub fn insert_routine(&self, routine: &Routine) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO routines
                 (id, user_id, title, is_active, sort_order, created_at,
                  kind, target_minutes, target_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    routine.id,
                    routine.user_id,
                    routine.title,
                    routine.is_active as i32,
                    routine.sort_order,
                    routine.created_at,
                    routine.kind.as_str(),
                    routine.target_minutes,
                    routine.target_count,
                ],
            )
            .map_err(|e| insert_error(e, format!("routine {}", routine.id)))?;
        Ok(())
    }

    pub fn get_routine(&self, id: &str) -> Result<Option<Routine>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ROUTINE_COLS} FROM routines WHERE id = ?1"
        ))?;
        let row = stmt.query_row(params![id], read_routine).optional()?;
        Ok(row)
    }

    pub fn list_routines(&self) -> Result<Vec<Routine>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ROUTINE_COLS} FROM routines ORDER BY user_id, sort_order, rowid"
        ))?;
        let rows = stmt.query_map([], read_routine)?;
        collect(rows)
    }

    pub fn list_routines_by_user(&self, user_id: &str) -> Result<Vec<Routine>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ROUTINE_COLS} FROM routines
             WHERE user_id = ?1 ORDER BY sort_order, rowid"
        ))?;
        let rows = stmt.query_map(params![user_id], read_routine)?;
        collect(rows)
    }

    pub fn list_active_routines(&self) -> Result<Vec<Routine>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ROUTINE_COLS} FROM routines
             WHERE is_active = 1 ORDER BY user_id, sort_order, rowid"
        ))?;
        let rows = stmt.query_map([], read_routine)?;
        collect(rows)
    }

    pub fn list_active_routines_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Routine>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ROUTINE_COLS} FROM routines
             WHERE user_id = ?1 AND is_active = 1 ORDER BY sort_order, rowid"
        ))?;
        let rows = stmt.query_map(params![user_id], read_routine)?;
        collect(rows)
    }

    pub fn next_routine_sort_order(&self, user_id: &str) -> Result<i64, StoreError> {
        let next: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM routines WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(next)
    }

    pub fn update_routine(&self, id: &str, patch: &RoutinePatch) -> Result<(), StoreError> {
        let mut sets: Vec<&str> = Vec::new();
        let mut binds: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        if let Some(title) = &patch.title {
            sets.push("title = ?");
            binds.push(Box::new(title.clone()));
        }
        if let Some(active) = patch.is_active {
            sets.push("is_active = ?");
            binds.push(Box::new(active as i32));
        }
        if sets.is_empty() {
            return match self.get_routine(id)? {
                Some(_) => Ok(()),
                None => Err(StoreError::NotFound(format!("routine {id}"))),
            };
        }
        let sql = format!("UPDATE routines SET {} WHERE id = ?", sets.join(", "));
        binds.push(Box::new(id.to_string()));
        let bind_refs: Vec<&dyn rusqlite::types::ToSql> =
            binds.iter().map(|b| b.as_ref()).collect();
        let affected = self.conn.execute(&sql, bind_refs.as_slice())?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("routine {id}")));
        }
        Ok(())
    }

    pub fn set_routine_sort_order(&self, id: &str, sort_order: i64) -> Result<(), StoreError> {
        let affected = self.conn.execute(
            "UPDATE routines SET sort_order = ?1 WHERE id = ?2",
            params![sort_order, id],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("routine {id}")));
        }
        Ok(())
    }

    /// Delete a single routine. Historical logs are kept; they disappear only
    /// through user-cascade deletion, a full reset, or an import. A no-op
    /// when the id is absent.
    pub fn delete_routine(&self, id: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM routines WHERE id = ?1", params![id])?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Daily logs
    // -----------------------------------------------------------------------

    pub fn insert_log(&self, log: &DailyLog) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO daily_logs
                 (date, routine_id, user_id, done, updated_at, spent_minutes, current_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    log.date,
                    log.routine_id,
                    log.user_id,
                    log.done as i32,
                    log.updated_at,
                    log.spent_minutes,
                    log.current_count,
                ],
            )
            .map_err(|e| insert_error(e, format!("log ({}, {})", log.date, log.routine_id)))?;
        Ok(())
    }

    pub fn get_log(&self, date: &str, routine_id: &str) -> Result<Option<DailyLog>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LOG_COLS} FROM daily_logs WHERE date = ?1 AND routine_id = ?2"
        ))?;
        let row = stmt
            .query_row(params![date, routine_id], read_log)
            .optional()?;
        Ok(row)
    }

    pub fn list_logs(&self) -> Result<Vec<DailyLog>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LOG_COLS} FROM daily_logs ORDER BY date, rowid"
        ))?;
        let rows = stmt.query_map([], read_log)?;
        collect(rows)
    }

    pub fn list_logs_by_date(&self, date: &str) -> Result<Vec<DailyLog>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LOG_COLS} FROM daily_logs WHERE date = ?1 ORDER BY rowid"
        ))?;
        let rows = stmt.query_map(params![date], read_log)?;
        collect(rows)
    }

    pub fn list_logs_for_user_on(
        &self,
        date: &str,
        user_id: &str,
    ) -> Result<Vec<DailyLog>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LOG_COLS} FROM daily_logs
             WHERE date = ?1 AND user_id = ?2 ORDER BY rowid"
        ))?;
        let rows = stmt.query_map(params![date, user_id], read_log)?;
        collect(rows)
    }

    pub fn list_logs_by_user(&self, user_id: &str) -> Result<Vec<DailyLog>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LOG_COLS} FROM daily_logs WHERE user_id = ?1 ORDER BY date, rowid"
        ))?;
        let rows = stmt.query_map(params![user_id], read_log)?;
        collect(rows)
    }

    /// Merge progress fields into the log at `(date, routine_id)`, stamping
    /// `updated_at`. Fails with `NotFound` when no such log exists.
    pub fn update_log(
        &self,
        date: &str,
        routine_id: &str,
        patch: &LogPatch,
    ) -> Result<(), StoreError> {
        let mut sets: Vec<&str> = vec!["updated_at = ?"];
        let mut binds: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(now_iso())];
        if let Some(done) = patch.done {
            sets.push("done = ?");
            binds.push(Box::new(done as i32));
        }
        if let Some(m) = patch.spent_minutes {
            sets.push("spent_minutes = ?");
            binds.push(Box::new(m));
        }
        if let Some(c) = patch.current_count {
            sets.push("current_count = ?");
            binds.push(Box::new(c));
        }
        let sql = format!(
            "UPDATE daily_logs SET {} WHERE date = ? AND routine_id = ?",
            sets.join(", ")
        );
        binds.push(Box::new(date.to_string()));
        binds.push(Box::new(routine_id.to_string()));
        let bind_refs: Vec<&dyn rusqlite::types::ToSql> =
            binds.iter().map(|b| b.as_ref()).collect();
        let affected = self.conn.execute(&sql, bind_refs.as_slice())?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("log ({date}, {routine_id})")));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Bulk operations (snapshot import / reset)
    // -----------------------------------------------------------------------

    /// Insert-or-replace a user row. Used by snapshot import, which takes
    /// records verbatim, duplicates included (last one wins).
    pub fn upsert_user(&self, user: &User) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO users (id, name, emoji, sort_order, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user.id, user.name, user.emoji, user.sort_order, user.created_at],
        )?;
        Ok(())
    }

    pub fn upsert_routine(&self, routine: &Routine) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO routines
             (id, user_id, title, is_active, sort_order, created_at,
              kind, target_minutes, target_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                routine.id,
                routine.user_id,
                routine.title,
                routine.is_active as i32,
                routine.sort_order,
                routine.created_at,
                routine.kind.as_str(),
                routine.target_minutes,
                routine.target_count,
            ],
        )?;
        Ok(())
    }

    pub fn upsert_log(&self, log: &DailyLog) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO daily_logs
             (date, routine_id, user_id, done, updated_at, spent_minutes, current_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                log.date,
                log.routine_id,
                log.user_id,
                log.done as i32,
                log.updated_at,
                log.spent_minutes,
                log.current_count,
            ],
        )?;
        Ok(())
    }

    /// Empty all three record collections. Settings are untouched. Call
    /// inside [`Store::in_transaction`] together with whatever replaces the
    /// data.
    pub fn clear_collections(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "DELETE FROM daily_logs; DELETE FROM routines; DELETE FROM users;",
        )?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Settings blobs
    // -----------------------------------------------------------------------

    pub fn get_settings_blob(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM settings WHERE key = ?1")?;
        let row = stmt
            .query_row(params![key], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(row)
    }

    pub fn put_settings_blob(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Migrations
// ---------------------------------------------------------------------------

/// v1: the original single-user layout. Routines and logs have no owner
/// column yet.
fn migrate_to_v1(tx: &Transaction<'_>) -> Result<(), StoreError> {
    tx.execute_batch(
        "
        CREATE TABLE routines (
            id              TEXT PRIMARY KEY,
            title           TEXT NOT NULL,
            is_active       INTEGER NOT NULL DEFAULT 1,
            sort_order      INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL,
            kind            TEXT NOT NULL,
            target_minutes  INTEGER,
            target_count    INTEGER
        );

        CREATE INDEX idx_routines_active ON routines(is_active);

        CREATE TABLE daily_logs (
            date            TEXT NOT NULL,
            routine_id      TEXT NOT NULL,
            done            INTEGER NOT NULL DEFAULT 0,
            updated_at      TEXT NOT NULL,
            spent_minutes   INTEGER,
            current_count   INTEGER,
            PRIMARY KEY (date, routine_id)
        );

        CREATE INDEX idx_daily_logs_date ON daily_logs(date);

        CREATE TABLE settings (
            key     TEXT PRIMARY KEY,
            value   TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}

/// v2: multi-profile support. Adds the users table, then back-fills
/// ownership: when any single-user data exists, one default user is
/// synthesized to own all of it.
fn migrate_to_v2(tx: &Transaction<'_>) -> Result<(), StoreError> {
    tx.execute_batch(
        "
        CREATE TABLE users (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            emoji       TEXT NOT NULL,
            sort_order  INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL
        );

        ALTER TABLE routines ADD COLUMN user_id TEXT NOT NULL DEFAULT '';
        ALTER TABLE daily_logs ADD COLUMN user_id TEXT NOT NULL DEFAULT '';

        CREATE INDEX idx_routines_user ON routines(user_id);
        CREATE INDEX idx_daily_logs_user ON daily_logs(user_id);
        ",
    )?;

    let legacy_rows: i64 = tx.query_row(
        "SELECT (SELECT COUNT(*) FROM routines) + (SELECT COUNT(*) FROM daily_logs)",
        [],
        |row| row.get(0),
    )?;
    if legacy_rows > 0 {
        tx.execute(
            "INSERT INTO users (id, name, emoji, sort_order, created_at)
             VALUES (?1, ?2, ?3, 0, ?4)",
            params![MIGRATED_USER_ID, MIGRATED_USER_NAME, MIGRATED_USER_EMOJI, now_iso()],
        )?;
        tx.execute(
            "UPDATE routines SET user_id = ?1",
            params![MIGRATED_USER_ID],
        )?;
        tx.execute(
            "UPDATE daily_logs SET user_id = ?1",
            params![MIGRATED_USER_ID],
        )?;
    }
    Ok(())
}

/// v3: dense user sort keys, 0..n in the current enumeration order.
fn migrate_to_v3(tx: &Transaction<'_>) -> Result<(), StoreError> {
    let mut stmt = tx.prepare("SELECT id FROM users ORDER BY sort_order, rowid")?;
    let ids: Vec<String> = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<_, _>>()?;
    for (i, id) in ids.iter().enumerate() {
        tx.execute(
            "UPDATE users SET sort_order = ?1 WHERE id = ?2",
            params![i as i64, id],
        )?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

const ROUTINE_COLS: &str =
    "id, user_id, title, is_active, sort_order, created_at, kind, target_minutes, target_count";

const LOG_COLS: &str =
    "date, routine_id, user_id, done, updated_at, spent_minutes, current_count";

fn read_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        emoji: row.get(2)?,
        sort_order: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn read_routine(row: &rusqlite::Row<'_>) -> rusqlite::Result<Routine> {
    let kind_str: String = row.get(6)?;
    let kind = RoutineKind::parse(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            rusqlite::types::Type::Text,
            format!("unknown routine kind {kind_str:?}").into(),
        )
    })?;
    Ok(Routine {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        is_active: row.get::<_, i32>(3)? != 0,
        sort_order: row.get(4)?,
        created_at: row.get(5)?,
        kind,
        target_minutes: row.get(7)?,
        target_count: row.get(8)?,
    })
}

fn read_log(row: &rusqlite::Row<'_>) -> rusqlite::Result<DailyLog> {
    Ok(DailyLog {
        date: row.get(0)?,
        routine_id: row.get(1)?,
        user_id: row.get(2)?,
        done: row.get::<_, i32>(3)? != 0,
        updated_at: row.get(4)?,
        spent_minutes: row.get(5)?,
        current_count: row.get(6)?,
    })
}

fn collect<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
) -> Result<Vec<T>, StoreError> {
    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
