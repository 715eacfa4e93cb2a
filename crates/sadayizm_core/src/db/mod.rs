//! SQLite backing for the troll store.
//!
//! # Responsibility
//! - Open connections tuned for a single-writer web process.
//! - Bring the `trolls` schema up to date before any repository touches it.
//!
//! # Invariants
//! - The schema version lives in `PRAGMA user_version`.
//! - A database written by a newer build is refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

/// File name of the SQLite store inside the data directory.
pub const DB_FILE_NAME: &str = "trolls.db";

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The directory meant to hold the database file could not be created.
    CreateDir {
        dir: PathBuf,
        source: std::io::Error,
    },
    SchemaTooNew {
        found: u32,
        supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::CreateDir { dir, source } => {
                write!(f, "cannot create database directory `{}`: {source}", dir.display())
            }
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "troll store schema v{found} was written by a newer build (this build supports v{supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::CreateDir { source, .. } => Some(source),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
