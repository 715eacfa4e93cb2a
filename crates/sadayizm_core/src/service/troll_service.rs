//! Troll use-case service.
//!
//! # Responsibility
//! - Provide the CRUD + search entry points used by HTTP and CLI callers.
//! - Validate raw input before anything reaches a repository.
//!
//! # Invariants
//! - Service APIs never bypass repository persistence contracts.
//! - Service layer remains storage-agnostic.
//! - A rejected input leaves the store unchanged.

use crate::model::troll::{Troll, TrollDraft, TrollId, TrollInput, TrollValidationError};
use crate::repo::troll_repo::{RepoError, TrollRepository};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, TrollServiceError>;

/// Service error for troll use-cases.
#[derive(Debug)]
pub enum TrollServiceError {
    /// Required input field missing or blank.
    Validation(TrollValidationError),
    /// Target record does not exist.
    NotFound(TrollId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for TrollServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "troll not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TrollServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<TrollValidationError> for TrollServiceError {
    fn from(value: TrollValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for TrollServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Use-case service wrapper for troll operations.
pub struct TrollService<R: TrollRepository> {
    repo: R,
}

impl<R: TrollRepository> TrollService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Label of the backing store, e.g. `sqlite`.
    pub fn backend_name(&self) -> &'static str {
        self.repo.backend_name()
    }

    /// All records, newest first.
    pub fn list(&self) -> ServiceResult<Vec<Troll>> {
        Ok(self.repo.list_trolls()?)
    }

    pub fn get(&self, id: TrollId) -> ServiceResult<Option<Troll>> {
        Ok(self.repo.get_troll(id)?)
    }

    /// Records whose nick or steam_id contain `query`, newest first.
    pub fn search(&self, query: &str) -> ServiceResult<Vec<Troll>> {
        Ok(self.repo.search_trolls(query)?)
    }

    /// Validates `input`, applies defaults and stores a new record.
    pub fn add(&self, input: &TrollInput) -> ServiceResult<Troll> {
        let draft = TrollDraft::from_input(input).inspect_err(|err| {
            warn!("event=troll_add module=service status=rejected reason={err}");
        })?;
        let troll = self.repo.create_troll(&draft)?;
        info!(
            "event=troll_add module=service status=ok backend={} id={}",
            self.repo.backend_name(),
            troll.id
        );
        Ok(troll)
    }

    /// Overwrites every editable field of `id`.
    ///
    /// Returns [`TrollServiceError::NotFound`] when `id` is unknown.
    pub fn update(&self, id: TrollId, input: &TrollInput) -> ServiceResult<Troll> {
        let draft = TrollDraft::from_input(input).inspect_err(|err| {
            warn!("event=troll_update module=service status=rejected id={id} reason={err}");
        })?;
        let troll = self.repo.update_troll(id, &draft)?;
        info!(
            "event=troll_update module=service status=ok backend={} id={}",
            self.repo.backend_name(),
            id
        );
        Ok(troll)
    }

    /// Hard-deletes `id`.
    ///
    /// Returns [`TrollServiceError::NotFound`] when nothing was removed.
    pub fn delete(&self, id: TrollId) -> ServiceResult<()> {
        if !self.repo.delete_troll(id)? {
            return Err(TrollServiceError::NotFound(id));
        }
        info!(
            "event=troll_delete module=service status=ok backend={} id={}",
            self.repo.backend_name(),
            id
        );
        Ok(())
    }
}
