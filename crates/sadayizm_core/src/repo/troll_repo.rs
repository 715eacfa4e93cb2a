//! Troll repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD + search APIs over canonical `trolls` storage.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths only accept validated `TrollDraft` values.
//! - List and search results are ordered by `date_added DESC, id DESC`.
//! - Search is an ASCII case-insensitive substring match on nick or steam_id.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::troll::{next_modified, now_epoch_ms, Troll, TrollDraft, TrollId};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

const TROLL_SELECT_SQL: &str = "SELECT
    id,
    nick,
    steam_id,
    steam_id64,
    reason,
    faceit_url,
    date_added,
    last_modified
FROM trolls";

const TROLL_ORDER_SQL: &str = "ORDER BY date_added DESC, id DESC";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by every storage backend.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Io(std::io::Error),
    NotFound(TrollId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    LockPoisoned,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "storage i/o error: {err}"),
            Self::NotFound(id) => write!(f, "troll not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted troll data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::LockPoisoned => write!(f, "storage lock poisoned by a panicked writer"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<std::io::Error> for RepoError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl<T> From<std::sync::PoisonError<T>> for RepoError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::LockPoisoned
    }
}

/// Repository interface for troll CRUD and search.
pub trait TrollRepository: Send + Sync {
    /// Short backend label used in logs and diagnostics.
    fn backend_name(&self) -> &'static str;
    fn list_trolls(&self) -> RepoResult<Vec<Troll>>;
    fn create_troll(&self, draft: &TrollDraft) -> RepoResult<Troll>;
    /// Fails with [`RepoError::NotFound`] and leaves storage untouched when
    /// `id` is unknown.
    fn update_troll(&self, id: TrollId, draft: &TrollDraft) -> RepoResult<Troll>;
    /// Returns whether a record was removed.
    fn delete_troll(&self, id: TrollId) -> RepoResult<bool>;
    fn get_troll(&self, id: TrollId) -> RepoResult<Option<Troll>>;
    fn search_trolls(&self, query: &str) -> RepoResult<Vec<Troll>>;
}

impl<T: TrollRepository + ?Sized> TrollRepository for Box<T> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn list_trolls(&self) -> RepoResult<Vec<Troll>> {
        (**self).list_trolls()
    }

    fn create_troll(&self, draft: &TrollDraft) -> RepoResult<Troll> {
        (**self).create_troll(draft)
    }

    fn update_troll(&self, id: TrollId, draft: &TrollDraft) -> RepoResult<Troll> {
        (**self).update_troll(id, draft)
    }

    fn delete_troll(&self, id: TrollId) -> RepoResult<bool> {
        (**self).delete_troll(id)
    }

    fn get_troll(&self, id: TrollId) -> RepoResult<Option<Troll>> {
        (**self).get_troll(id)
    }

    fn search_trolls(&self, query: &str) -> RepoResult<Vec<Troll>> {
        (**self).search_trolls(query)
    }
}

/// SQLite-backed troll repository.
///
/// Owns its connection; calls are serialized through a mutex.
pub struct SqliteTrollRepository {
    conn: Mutex<Connection>,
}

impl SqliteTrollRepository {
    /// Wraps a connection returned by [`crate::db::open_db`] or
    /// [`crate::db::open_db_in_memory`].
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable` when the `trolls` table is absent.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_user_version(&conn)?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let has_table: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'trolls'
            );",
            [],
            |row| row.get(0),
        )?;
        if !has_table {
            return Err(RepoError::MissingRequiredTable("trolls"));
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, Connection>> {
        Ok(self.conn.lock()?)
    }
}

impl TrollRepository for SqliteTrollRepository {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn list_trolls(&self) -> RepoResult<Vec<Troll>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{TROLL_SELECT_SQL} {TROLL_ORDER_SQL};"))?;
        let trolls = stmt
            .query_map([], parse_troll_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(trolls)
    }

    fn create_troll(&self, draft: &TrollDraft) -> RepoResult<Troll> {
        let conn = self.lock()?;
        let now_ms = now_epoch_ms();

        conn.execute(
            "INSERT INTO trolls (
                nick,
                steam_id,
                steam_id64,
                reason,
                faceit_url,
                date_added,
                last_modified
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6);",
            params![
                draft.nick.as_str(),
                draft.steam_id.as_str(),
                draft.steam_id64.as_str(),
                draft.reason.as_str(),
                draft.faceit_url.as_str(),
                now_ms,
            ],
        )?;

        let id = conn.last_insert_rowid();
        debug!("event=troll_insert module=repo backend=sqlite id={id}");
        select_by_id(&conn, id)?
            .ok_or_else(|| RepoError::InvalidData(format!("inserted troll {id} not readable")))
    }

    fn update_troll(&self, id: TrollId, draft: &TrollDraft) -> RepoResult<Troll> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let previous: Option<i64> = tx
            .query_row(
                "SELECT last_modified FROM trolls WHERE id = ?1;",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(previous) = previous else {
            return Err(RepoError::NotFound(id));
        };

        tx.execute(
            "UPDATE trolls
             SET
                nick = ?1,
                steam_id = ?2,
                steam_id64 = ?3,
                reason = ?4,
                faceit_url = ?5,
                last_modified = ?6
             WHERE id = ?7;",
            params![
                draft.nick.as_str(),
                draft.steam_id.as_str(),
                draft.steam_id64.as_str(),
                draft.reason.as_str(),
                draft.faceit_url.as_str(),
                next_modified(previous, now_epoch_ms()),
                id,
            ],
        )?;

        let updated = select_by_id(&tx, id)?
            .ok_or_else(|| RepoError::InvalidData(format!("updated troll {id} not readable")))?;
        tx.commit()?;
        Ok(updated)
    }

    fn delete_troll(&self, id: TrollId) -> RepoResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM trolls WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn get_troll(&self, id: TrollId) -> RepoResult<Option<Troll>> {
        let conn = self.lock()?;
        select_by_id(&conn, id)
    }

    fn search_trolls(&self, query: &str) -> RepoResult<Vec<Troll>> {
        let pattern = format!("%{}%", escape_like(query.trim()));
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{TROLL_SELECT_SQL}
             WHERE nick LIKE ?1 ESCAPE '\\' OR steam_id LIKE ?1 ESCAPE '\\'
             {TROLL_ORDER_SQL};"
        ))?;
        let trolls = stmt
            .query_map([pattern], parse_troll_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(trolls)
    }
}

fn select_by_id(conn: &Connection, id: TrollId) -> RepoResult<Option<Troll>> {
    let troll = conn
        .query_row(
            &format!("{TROLL_SELECT_SQL} WHERE id = ?1;"),
            [id],
            parse_troll_row,
        )
        .optional()?;
    Ok(troll)
}

fn parse_troll_row(row: &Row<'_>) -> rusqlite::Result<Troll> {
    Ok(Troll {
        id: row.get("id")?,
        nick: row.get("nick")?,
        steam_id: row.get("steam_id")?,
        steam_id64: row.get("steam_id64")?,
        reason: row.get("reason")?,
        faceit_url: row.get("faceit_url")?,
        date_added: row.get("date_added")?,
        last_modified: row.get("last_modified")?,
    })
}

// SQLite LIKE already folds ASCII case, which is the contract for search.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
