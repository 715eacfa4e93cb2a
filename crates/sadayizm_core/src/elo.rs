//! ELO board shaping for the landing page.
//!
//! # Responsibility
//! - Normalize ratings returned by the third-party lookup into integers.
//! - Rank the fixed profile list by rating.
//!
//! # Invariants
//! - Unresolved ratings render as `N/A` and always sort last.
//! - Ranking is stable: equal ratings keep profile order.
//!
//! Upstream sometimes formats ratings with a thousands separator that gets
//! parsed as a decimal point and loses trailing zeros (`2.34` for 2340).
//! Any non-integer value is therefore read as thousands and scaled by 1000.
//! This is a best-effort normalization, not a contract with the upstream.

use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

/// Text shown for a rating that could not be resolved.
pub const UNRESOLVED_DISPLAY: &str = "N/A";

const DEFAULT_PROFILES: &[(&str, &str)] = &[
    ("anar", "https://steamcommunity.com/id/anrz/"),
    (
        "angry",
        "https://steamcommunity.com/id/69qui9uwjr9qjq9124u1925u15/",
    ),
    ("nyoh", "https://steamcommunity.com/id/srz1/"),
    ("rks", "https://steamcommunity.com/id/5t9/"),
    ("nikito", "https://steamcommunity.com/id/nkto/"),
];

/// A named profile whose rating is displayed on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EloProfile {
    pub name: String,
    pub profile_url: String,
}

impl EloProfile {
    pub fn new(name: impl Into<String>, profile_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profile_url: profile_url.into(),
        }
    }
}

/// The profile set shown on the landing page.
pub fn default_profiles() -> Vec<EloProfile> {
    DEFAULT_PROFILES
        .iter()
        .map(|(name, url)| EloProfile::new(*name, *url))
        .collect()
}

/// One board row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EloEntry {
    pub name: String,
    pub profile_url: String,
    pub elo: Option<u32>,
    pub level: Option<u32>,
    /// Rating as text, or `N/A`.
    pub display: String,
}

impl EloEntry {
    pub fn new(profile: &EloProfile, elo: Option<u32>, level: Option<u32>) -> Self {
        Self {
            name: profile.name.clone(),
            profile_url: profile.profile_url.clone(),
            elo,
            level,
            display: elo.map_or_else(|| UNRESOLVED_DISPLAY.to_string(), |elo| elo.to_string()),
        }
    }

    pub fn unresolved(profile: &EloProfile) -> Self {
        Self::new(profile, None, None)
    }
}

/// Rating looked up for a single SteamID64.
///
/// `nickname` is the Faceit nickname the id resolved to; `error` explains a
/// lookup that could not get that far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SteamElo {
    pub steam_id64: String,
    pub nickname: Option<String>,
    pub elo: Option<u32>,
    pub level: Option<u32>,
    pub display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SteamElo {
    pub fn resolved(
        steam_id64: impl Into<String>,
        nickname: impl Into<String>,
        elo: Option<u32>,
        level: Option<u32>,
    ) -> Self {
        Self {
            steam_id64: steam_id64.into(),
            nickname: Some(nickname.into()),
            elo,
            level,
            display: elo.map_or_else(|| UNRESOLVED_DISPLAY.to_string(), |elo| elo.to_string()),
            error: None,
        }
    }

    pub fn failed(
        steam_id64: impl Into<String>,
        nickname: Option<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            steam_id64: steam_id64.into(),
            nickname,
            elo: None,
            level: None,
            display: UNRESOLVED_DISPLAY.to_string(),
            error: Some(error.into()),
        }
    }
}

/// SteamID64 values are 17-digit decimal numbers; anything non-numeric is refused.
pub fn is_steam_id64(value: &str) -> bool {
    !value.is_empty() && value.len() <= 20 && value.bytes().all(|byte| byte.is_ascii_digit())
}

/// Extracts the Faceit nickname from a resolver response body.
pub fn parse_nickname(body: &Value) -> Option<String> {
    body.get("nickname")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|nickname| !nickname.is_empty())
        .map(str::to_string)
}

/// Sorts rows by rating descending; unresolved rows go last.
pub fn rank_entries(entries: &mut [EloEntry]) {
    entries.sort_by(|a, b| match (a.elo, b.elo) {
        (Some(left), Some(right)) => right.cmp(&left),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Extracts `(elo, level)` from a lookup response body.
pub fn parse_lookup(body: &Value) -> (Option<u32>, Option<u32>) {
    let elo = body.get("elo").and_then(parse_elo);
    let level = body.get("level").and_then(parse_level);
    (elo, level)
}

/// Normalizes a rating given as a JSON number or numeric string.
pub fn parse_elo(value: &Value) -> Option<u32> {
    let raw = numeric_value(value)?;
    if !raw.is_finite() || raw < 0.0 {
        return None;
    }

    let scaled = if raw.fract() == 0.0 {
        raw
    } else {
        (raw * 1000.0).round()
    };
    to_u32(scaled)
}

/// Skill level is a small integer; fractional values are rejected.
pub fn parse_level(value: &Value) -> Option<u32> {
    let raw = numeric_value(value)?;
    if raw.fract() != 0.0 || raw < 0.0 {
        return None;
    }
    to_u32(raw)
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_numeric_text(text),
        _ => None,
    }
}

fn parse_numeric_text(text: &str) -> Option<f64> {
    let compact: String = text
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .map(|ch| if ch == ',' { '.' } else { ch })
        .collect();
    if compact.is_empty() {
        return None;
    }

    // Several separators can only be digit grouping, e.g. `1.234.567`.
    let normalized = if compact.matches('.').count() > 1 {
        compact.replace('.', "")
    } else {
        compact
    };
    normalized.parse::<f64>().ok()
}

fn to_u32(value: f64) -> Option<u32> {
    if value > f64::from(u32::MAX) {
        return None;
    }
    Some(value as u32)
}

#[cfg(test)]
mod tests {
    use super::{
        default_profiles, is_steam_id64, parse_elo, parse_level, parse_lookup, parse_nickname,
        rank_entries, EloEntry, SteamElo, UNRESOLVED_DISPLAY,
    };
    use serde_json::json;

    #[test]
    fn parse_elo_accepts_integers_and_numeric_strings() {
        assert_eq!(parse_elo(&json!(2345)), Some(2345));
        assert_eq!(parse_elo(&json!("2345")), Some(2345));
        assert_eq!(parse_elo(&json!(" 1 870 ")), Some(1870));
    }

    #[test]
    fn parse_elo_scales_decimal_values_as_thousands() {
        assert_eq!(parse_elo(&json!(2.345)), Some(2345));
        assert_eq!(parse_elo(&json!("2.34")), Some(2340));
        assert_eq!(parse_elo(&json!("2,345")), Some(2345));
        assert_eq!(parse_elo(&json!("1.2")), Some(1200));
    }

    #[test]
    fn parse_elo_rejects_garbage() {
        assert_eq!(parse_elo(&json!("N/A")), None);
        assert_eq!(parse_elo(&json!("")), None);
        assert_eq!(parse_elo(&json!(-10)), None);
        assert_eq!(parse_elo(&json!(null)), None);
        assert_eq!(parse_elo(&json!({"elo": 1})), None);
    }

    #[test]
    fn parse_level_rejects_fractions() {
        assert_eq!(parse_level(&json!(10)), Some(10));
        assert_eq!(parse_level(&json!("7")), Some(7));
        assert_eq!(parse_level(&json!(7.5)), None);
    }

    #[test]
    fn parse_lookup_reads_both_fields() {
        let body = json!({"elo": "2.1", "level": 10, "nickname": "anar"});
        assert_eq!(parse_lookup(&body), (Some(2100), Some(10)));
        assert_eq!(parse_lookup(&json!({})), (None, None));
    }

    #[test]
    fn rank_entries_sorts_descending_with_unresolved_last() {
        let profiles = default_profiles();
        let mut entries = vec![
            EloEntry::new(&profiles[0], Some(1500), None),
            EloEntry::unresolved(&profiles[1]),
            EloEntry::new(&profiles[2], Some(2500), Some(10)),
            EloEntry::unresolved(&profiles[3]),
            EloEntry::new(&profiles[4], Some(1500), None),
        ];

        rank_entries(&mut entries);
        let names: Vec<_> = entries.iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(names, vec!["nyoh", "anar", "nikito", "angry", "rks"]);
        assert_eq!(entries[4].display, UNRESOLVED_DISPLAY);
        assert_eq!(entries[0].display, "2500");
    }

    #[test]
    fn nickname_must_be_a_non_blank_string() {
        assert_eq!(parse_nickname(&json!({"nickname": " anar "})), Some("anar".to_string()));
        assert_eq!(parse_nickname(&json!({"nickname": ""})), None);
        assert_eq!(parse_nickname(&json!({"nickname": 12})), None);
        assert_eq!(parse_nickname(&json!([])), None);
    }

    #[test]
    fn steam_id64_accepts_digits_only() {
        assert!(is_steam_id64("76561198000000001"));
        assert!(!is_steam_id64("No resuelto"));
        assert!(!is_steam_id64(""));
        assert!(!is_steam_id64("7656119800000000a"));
    }

    #[test]
    fn failed_steam_lookup_renders_unresolved() {
        let lookup = SteamElo::failed("7656", None, "no nickname");
        assert_eq!(lookup.display, UNRESOLVED_DISPLAY);
        assert_eq!(lookup.elo, None);

        let resolved = SteamElo::resolved("7656", "anar", Some(2100), Some(10));
        assert_eq!(resolved.display, "2100");
        assert_eq!(resolved.error, None);
    }
}
