//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the troll store contract shared by every backend.
//! - Isolate SQLite/file/memory details from service orchestration.
//!
//! # Invariants
//! - Repositories only persist validated `TrollDraft` values.
//! - Repository APIs return semantic errors (`NotFound`) in addition to
//!   storage transport errors.
//! - All backends are interchangeable from the caller's perspective.

pub mod json_repo;
pub mod memory_repo;
pub mod troll_repo;
