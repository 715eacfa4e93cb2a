//! Flat-file JSON troll repository.
//!
//! # Responsibility
//! - Persist the whole troll set as one JSON document on disk.
//! - Replace the document atomically on every write.
//!
//! # Invariants
//! - Writers are serialized by an in-process mutex; there is no lock file.
//! - A write lands in a sibling temp file that is synced and renamed over
//!   the target exactly once. Readers never observe a torn document.
//! - `lastId` only grows, so ids are not reused after deletes.
//! - A document that fails to parse is reported, never overwritten.
//! - Files from the first release (a bare array with string ids and ISO
//!   dates) are read with fresh integer ids and rewritten in the current
//!   layout on the next write.

use crate::model::troll::{
    normalize_search_query, now_epoch_ms, sort_newest_first, text_or_number, Troll, TrollDraft,
    TrollId, DEFAULT_REASON, STEAM_ID64_UNRESOLVED,
};
use crate::repo::troll_repo::{RepoError, RepoResult, TrollRepository};
use chrono::DateTime;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::NamedTempFile;

/// File name of the JSON store inside the data directory.
pub const JSON_FILE_NAME: &str = "trolls.json";

/// On-disk document layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct TrollDocument {
    trolls: Vec<Troll>,
    #[serde(rename = "lastId", default)]
    last_id: TrollId,
}

/// Record shape written by the first file-backed release: string ids made
/// of a timestamp plus random suffix, ISO-8601 dates, and no
/// `last_modified` until the first edit.
#[derive(Deserialize)]
struct LegacyTroll {
    #[serde(rename = "id")]
    _id: String,
    #[serde(deserialize_with = "text_or_number")]
    nick: String,
    #[serde(deserialize_with = "text_or_number")]
    steam_id: String,
    #[serde(default)]
    steam_id64: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    faceit_url: Option<String>,
    date_added: String,
    #[serde(default)]
    last_modified: Option<String>,
}

impl LegacyTroll {
    fn into_troll(self, id: TrollId) -> Result<Troll, String> {
        let date_added = parse_iso_ms(&self.date_added)?;
        let last_modified = match self.last_modified.as_deref() {
            Some(raw) => parse_iso_ms(raw)?.max(date_added),
            None => date_added,
        };
        let or_default = |value: Option<String>, default: &str| {
            value
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Troll {
            id,
            nick: self.nick,
            steam_id: self.steam_id,
            steam_id64: or_default(self.steam_id64, STEAM_ID64_UNRESOLVED),
            reason: or_default(self.reason, DEFAULT_REASON),
            faceit_url: self.faceit_url.unwrap_or_default(),
            date_added,
            last_modified,
        })
    }
}

fn parse_iso_ms(raw: &str) -> Result<i64, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|parsed| parsed.timestamp_millis())
        .map_err(|err| format!("invalid legacy timestamp `{raw}`: {err}"))
}

/// Accepted layouts when reading; writes always use [`TrollDocument`].
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredLayout {
    Bare(Vec<Troll>),
    Legacy(Vec<LegacyTroll>),
    Document(TrollDocument),
}

impl StoredLayout {
    fn into_document(self) -> Result<TrollDocument, String> {
        let mut document = match self {
            Self::Bare(trolls) => TrollDocument { trolls, last_id: 0 },
            // Legacy ids are not integers; renumber in file order, oldest first.
            Self::Legacy(records) => TrollDocument {
                trolls: records
                    .into_iter()
                    .zip(1..)
                    .map(|(record, id)| record.into_troll(id))
                    .collect::<Result<_, _>>()?,
                last_id: 0,
            },
            Self::Document(document) => document,
        };
        let max_id = document.trolls.iter().map(|troll| troll.id).max().unwrap_or(0);
        document.last_id = document.last_id.max(max_id);
        Ok(document)
    }
}

/// Repository storing every record in a single JSON file.
#[derive(Debug)]
pub struct JsonFileTrollRepository {
    path: PathBuf,
    write_guard: Mutex<()>,
}

impl JsonFileTrollRepository {
    /// Uses `path` as the document location. The file and its parent
    /// directory are created lazily on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, ()>> {
        Ok(self.write_guard.lock()?)
    }

    fn read_document(&self) -> RepoResult<TrollDocument> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(TrollDocument::default()),
            Err(err) => return Err(err.into()),
        };

        if raw.trim().is_empty() {
            return Ok(TrollDocument::default());
        }

        serde_json::from_str::<StoredLayout>(&raw)
            .map_err(|err| err.to_string())
            .and_then(StoredLayout::into_document)
            .map_err(|err| {
                error!(
                    "event=json_store_read module=repo status=error path={} error={}",
                    self.path.display(),
                    err
                );
                RepoError::InvalidData(format!("{}: {err}", self.path.display()))
            })
    }

    fn write_document(&self, document: &TrollDocument) -> RepoResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut temp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut temp, document)
            .map_err(|err| RepoError::InvalidData(format!("serialize troll document: {err}")))?;
        temp.write_all(b"\n")?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|err| RepoError::Io(err.error))?;

        debug!(
            "event=json_store_write module=repo status=ok path={} count={}",
            self.path.display(),
            document.trolls.len()
        );
        Ok(())
    }
}

impl TrollRepository for JsonFileTrollRepository {
    fn backend_name(&self) -> &'static str {
        "json"
    }

    fn list_trolls(&self) -> RepoResult<Vec<Troll>> {
        let _guard = self.lock()?;
        let mut trolls = self.read_document()?.trolls;
        sort_newest_first(&mut trolls);
        Ok(trolls)
    }

    fn create_troll(&self, draft: &TrollDraft) -> RepoResult<Troll> {
        let _guard = self.lock()?;
        let mut document = self.read_document()?;

        document.last_id += 1;
        let troll = Troll::from_draft(document.last_id, draft, now_epoch_ms());
        document.trolls.push(troll.clone());

        self.write_document(&document)?;
        Ok(troll)
    }

    fn update_troll(&self, id: TrollId, draft: &TrollDraft) -> RepoResult<Troll> {
        let _guard = self.lock()?;
        let mut document = self.read_document()?;

        let troll = document
            .trolls
            .iter_mut()
            .find(|troll| troll.id == id)
            .ok_or(RepoError::NotFound(id))?;
        troll.apply_draft(draft, now_epoch_ms());
        let updated = troll.clone();

        self.write_document(&document)?;
        Ok(updated)
    }

    fn delete_troll(&self, id: TrollId) -> RepoResult<bool> {
        let _guard = self.lock()?;
        let mut document = self.read_document()?;

        let before = document.trolls.len();
        document.trolls.retain(|troll| troll.id != id);
        if document.trolls.len() == before {
            return Ok(false);
        }

        self.write_document(&document)?;
        Ok(true)
    }

    fn get_troll(&self, id: TrollId) -> RepoResult<Option<Troll>> {
        let _guard = self.lock()?;
        let document = self.read_document()?;
        Ok(document.trolls.into_iter().find(|troll| troll.id == id))
    }

    fn search_trolls(&self, query: &str) -> RepoResult<Vec<Troll>> {
        let needle = normalize_search_query(query);
        let mut trolls = self.list_trolls()?;
        trolls.retain(|troll| troll.matches(&needle));
        Ok(trolls)
    }
}
