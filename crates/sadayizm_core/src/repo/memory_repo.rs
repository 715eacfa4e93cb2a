//! Process-memory troll repository.
//!
//! Records live for the lifetime of the owning value; nothing survives a
//! restart. Construct one per process and share it by reference.

use crate::model::troll::{
    normalize_search_query, now_epoch_ms, sort_newest_first, Troll, TrollDraft, TrollId,
};
use crate::repo::troll_repo::{RepoError, RepoResult, TrollRepository};
use std::sync::Mutex;

#[derive(Debug)]
struct MemoryState {
    trolls: Vec<Troll>,
    next_id: TrollId,
}

/// In-memory repository guarded by a mutex.
#[derive(Debug)]
pub struct MemoryTrollRepository {
    state: Mutex<MemoryState>,
}

impl MemoryTrollRepository {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                trolls: Vec::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for MemoryTrollRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl TrollRepository for MemoryTrollRepository {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn list_trolls(&self) -> RepoResult<Vec<Troll>> {
        let state = self.state.lock()?;
        let mut trolls = state.trolls.clone();
        sort_newest_first(&mut trolls);
        Ok(trolls)
    }

    fn create_troll(&self, draft: &TrollDraft) -> RepoResult<Troll> {
        let mut state = self.state.lock()?;
        let id = state.next_id;
        state.next_id += 1;

        let troll = Troll::from_draft(id, draft, now_epoch_ms());
        state.trolls.push(troll.clone());
        Ok(troll)
    }

    fn update_troll(&self, id: TrollId, draft: &TrollDraft) -> RepoResult<Troll> {
        let mut state = self.state.lock()?;
        let troll = state
            .trolls
            .iter_mut()
            .find(|troll| troll.id == id)
            .ok_or(RepoError::NotFound(id))?;

        troll.apply_draft(draft, now_epoch_ms());
        Ok(troll.clone())
    }

    fn delete_troll(&self, id: TrollId) -> RepoResult<bool> {
        let mut state = self.state.lock()?;
        let before = state.trolls.len();
        state.trolls.retain(|troll| troll.id != id);
        Ok(state.trolls.len() < before)
    }

    fn get_troll(&self, id: TrollId) -> RepoResult<Option<Troll>> {
        let state = self.state.lock()?;
        Ok(state.trolls.iter().find(|troll| troll.id == id).cloned())
    }

    fn search_trolls(&self, query: &str) -> RepoResult<Vec<Troll>> {
        let needle = normalize_search_query(query);
        let mut trolls = self.list_trolls()?;
        trolls.retain(|troll| troll.matches(&needle));
        Ok(trolls)
    }
}
