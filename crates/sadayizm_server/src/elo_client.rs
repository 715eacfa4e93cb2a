//! ELO board fetcher.
//!
//! Looks up each configured profile against the upstream rating service in
//! small concurrent batches, and resolves single SteamID64 values through the
//! nickname resolver first. Every request has a timeout and bounded retries
//! with linear backoff; a lookup that still fails renders as `N/A`.

use crate::config::EloConfig;
use futures::future::join_all;
use log::{debug, warn};
use reqwest::{Client, RequestBuilder};
use sadayizm_core::elo::{
    parse_lookup, parse_nickname, rank_entries, EloEntry, EloProfile, SteamElo,
};
use serde_json::Value;
use std::time::Instant;

const NICKNAME_UNRESOLVED: &str = "No se pudo resolver nickname";
const RATING_UNAVAILABLE: &str = "No se pudo obtener ELO";

pub struct EloClient {
    http: Client,
    config: EloConfig,
}

impl EloClient {
    pub fn new(config: EloConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// Fetches every profile and returns the ranked board.
    pub async fn board(&self) -> Vec<EloEntry> {
        let started_at = Instant::now();
        let mut entries = Vec::with_capacity(self.config.profiles.len());

        for batch in self.config.profiles.chunks(self.config.batch_size.max(1)) {
            entries.extend(join_all(batch.iter().map(|profile| self.lookup(profile))).await);
        }

        rank_entries(&mut entries);
        debug!(
            "event=elo_board module=elo status=ok profiles={} resolved={} duration_ms={}",
            entries.len(),
            entries.iter().filter(|entry| entry.elo.is_some()).count(),
            started_at.elapsed().as_millis()
        );
        entries
    }

    /// Resolves `steam_id64` to a Faceit nickname, then looks up its rating.
    ///
    /// `steam_id64` must already be checked with `elo::is_steam_id64`.
    pub async fn lookup_by_steam64(&self, steam_id64: &str) -> SteamElo {
        let resolver_url = format!(
            "{}/{}",
            self.config.resolver_endpoint.trim_end_matches('/'),
            steam_id64
        );
        let nickname = self
            .get_json(steam_id64, || self.http.get(&resolver_url))
            .await
            .as_ref()
            .and_then(parse_nickname);
        let Some(nickname) = nickname else {
            warn!("event=nickname_resolve module=elo status=unresolved steam_id64={steam_id64}");
            return SteamElo::failed(steam_id64, None, NICKNAME_UNRESOLVED);
        };

        let rating = self
            .get_json(&nickname, || self.rating_request(&nickname))
            .await;
        match rating {
            Some(body) => {
                let (elo, level) = parse_lookup(&body);
                SteamElo::resolved(steam_id64, nickname, elo, level)
            }
            None => SteamElo::failed(steam_id64, Some(nickname), RATING_UNAVAILABLE),
        }
    }

    async fn lookup(&self, profile: &EloProfile) -> EloEntry {
        let Some(body) = self
            .get_json(&profile.name, || self.rating_request(&profile.name))
            .await
        else {
            return EloEntry::unresolved(profile);
        };

        let (elo, level) = parse_lookup(&body);
        if elo.is_none() {
            warn!(
                "event=elo_lookup module=elo status=unparsed name={} body={}",
                profile.name, body
            );
        }
        EloEntry::new(profile, elo, level)
    }

    fn rating_request(&self, nickname: &str) -> RequestBuilder {
        self.http
            .get(&self.config.endpoint)
            .query(&[("n", nickname)])
    }

    /// Sends `request()` until it yields a JSON body or attempts run out.
    async fn get_json(
        &self,
        target: &str,
        request: impl Fn() -> RequestBuilder,
    ) -> Option<Value> {
        let attempts = self.config.attempts.max(1);

        for attempt in 1..=attempts {
            match send_once(request()).await {
                Ok(body) => return Some(body),
                Err(err) => {
                    warn!(
                        "event=elo_lookup module=elo status=error target={} attempt={}/{} timeout={} error={}",
                        target,
                        attempt,
                        attempts,
                        err.is_timeout(),
                        err
                    );
                    if attempt < attempts {
                        tokio::time::sleep(self.config.backoff * attempt).await;
                    }
                }
            }
        }
        None
    }
}

async fn send_once(request: RequestBuilder) -> Result<Value, reqwest::Error> {
    request
        .send()
        .await?
        .error_for_status()?
        .json::<Value>()
        .await
}
