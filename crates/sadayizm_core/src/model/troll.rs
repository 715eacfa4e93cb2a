//! Troll record domain model.
//!
//! # Responsibility
//! - Define the canonical flagged-player record stored by every backend.
//! - Normalize raw request input into a validated draft with defaults.
//!
//! # Invariants
//! - `id` is assigned by the store and never reused for another record.
//! - `nick` and `steam_id` are never blank once persisted.
//! - `last_modified >= date_added`, strictly greater after any update.

use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

/// Store-assigned record identifier.
pub type TrollId = i64;

/// Placeholder stored when no 64-bit Steam ID was supplied.
pub const STEAM_ID64_UNRESOLVED: &str = "No resuelto";
/// Placeholder stored when no reason was supplied.
pub const DEFAULT_REASON: &str = "Sin razón especificada";

/// Canonical persisted troll record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Troll {
    pub id: TrollId,
    pub nick: String,
    /// Platform identifier or profile URL fragment. Not format-validated.
    pub steam_id: String,
    pub steam_id64: String,
    pub reason: String,
    pub faceit_url: String,
    /// Unix epoch milliseconds, set once at creation.
    pub date_added: i64,
    /// Unix epoch milliseconds, refreshed by every update.
    pub last_modified: i64,
}

impl Troll {
    /// Builds a fresh record from a validated draft.
    pub fn from_draft(id: TrollId, draft: &TrollDraft, now_ms: i64) -> Self {
        Self {
            id,
            nick: draft.nick.clone(),
            steam_id: draft.steam_id.clone(),
            steam_id64: draft.steam_id64.clone(),
            reason: draft.reason.clone(),
            faceit_url: draft.faceit_url.clone(),
            date_added: now_ms,
            last_modified: now_ms,
        }
    }

    /// Overwrites every editable field and refreshes `last_modified`.
    ///
    /// `last_modified` always moves forward, even when two writes land in the
    /// same millisecond.
    pub fn apply_draft(&mut self, draft: &TrollDraft, now_ms: i64) {
        self.nick = draft.nick.clone();
        self.steam_id = draft.steam_id.clone();
        self.steam_id64 = draft.steam_id64.clone();
        self.reason = draft.reason.clone();
        self.faceit_url = draft.faceit_url.clone();
        self.last_modified = next_modified(self.last_modified, now_ms);
    }

    /// ASCII case-insensitive substring match against `nick` or `steam_id`.
    ///
    /// `needle` must already be lowercased with [`normalize_search_query`].
    pub fn matches(&self, needle: &str) -> bool {
        self.nick.to_ascii_lowercase().contains(needle)
            || self.steam_id.to_ascii_lowercase().contains(needle)
    }
}

/// Raw create/update payload as received from callers.
///
/// Field names follow the camelCase request shape. Steam ids are accepted as
/// JSON strings or numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrollInput {
    pub nick: Option<String>,
    #[serde(default, deserialize_with = "optional_text_or_number")]
    pub steam_id: Option<String>,
    #[serde(default, deserialize_with = "optional_text_or_number")]
    pub steam_id64: Option<String>,
    pub reason: Option<String>,
    pub faceit_url: Option<String>,
}

impl TrollInput {
    /// Convenience constructor for the two required fields.
    pub fn new(nick: impl Into<String>, steam_id: impl Into<String>) -> Self {
        Self {
            nick: Some(nick.into()),
            steam_id: Some(steam_id.into()),
            ..Self::default()
        }
    }
}

/// Validated editable fields with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrollDraft {
    pub nick: String,
    pub steam_id: String,
    pub steam_id64: String,
    pub reason: String,
    pub faceit_url: String,
}

impl TrollDraft {
    /// Trims every field, rejects blank required fields and fills defaults.
    pub fn from_input(input: &TrollInput) -> Result<Self, TrollValidationError> {
        let nick = trimmed(input.nick.as_deref()).ok_or(TrollValidationError::MissingNick)?;
        let steam_id =
            trimmed(input.steam_id.as_deref()).ok_or(TrollValidationError::MissingSteamId)?;

        Ok(Self {
            nick,
            steam_id,
            steam_id64: trimmed(input.steam_id64.as_deref())
                .unwrap_or_else(|| STEAM_ID64_UNRESOLVED.to_string()),
            reason: trimmed(input.reason.as_deref()).unwrap_or_else(|| DEFAULT_REASON.to_string()),
            faceit_url: trimmed(input.faceit_url.as_deref()).unwrap_or_default(),
        })
    }
}

/// Input validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrollValidationError {
    MissingNick,
    MissingSteamId,
}

impl Display for TrollValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingNick => write!(f, "nick is required"),
            Self::MissingSteamId => write!(f, "steamId is required"),
        }
    }
}

impl Error for TrollValidationError {}

/// Lowercases and trims a search query for [`Troll::matches`].
pub fn normalize_search_query(query: &str) -> String {
    query.trim().to_ascii_lowercase()
}

/// Current wall-clock time in unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}

/// Next `last_modified` value: wall clock, but never behind `previous + 1`.
pub fn next_modified(previous: i64, now_ms: i64) -> i64 {
    now_ms.max(previous.saturating_add(1))
}

/// Orders records newest first, breaking same-millisecond ties by id.
pub fn sort_newest_first(trolls: &mut [Troll]) {
    trolls.sort_by(|a, b| {
        b.date_added
            .cmp(&a.date_added)
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// A JSON value that callers may send either quoted or as a bare number.
#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

impl TextOrNumber {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        }
    }
}

/// Reads a string field that may also arrive as a JSON number.
pub(crate) fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    TextOrNumber::deserialize(deserializer).map(TextOrNumber::into_text)
}

fn optional_text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<TextOrNumber>::deserialize(deserializer)?.map(TextOrNumber::into_text))
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
