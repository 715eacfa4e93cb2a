//! Core domain logic for the sadayizm troll list.
//! This crate is the single source of truth for record invariants.

pub mod db;
pub mod elo;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod starfield;

pub use logging::{
    flush_logging, init_logging, logging_status, LogLevel, LoggingConfig, LoggingError,
};
pub use model::troll::{
    Troll, TrollDraft, TrollId, TrollInput, TrollValidationError, DEFAULT_REASON,
    STEAM_ID64_UNRESOLVED,
};
pub use repo::json_repo::JsonFileTrollRepository;
pub use repo::memory_repo::MemoryTrollRepository;
pub use repo::troll_repo::{RepoError, RepoResult, SqliteTrollRepository, TrollRepository};
pub use service::diagnostics::{run_diagnostics, CheckStatus, DiagnosticsReport};
pub use service::troll_service::{ServiceResult, TrollService, TrollServiceError};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
