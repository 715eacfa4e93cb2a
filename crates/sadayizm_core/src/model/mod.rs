//! Domain model for the troll list.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep request-shape normalization next to the record it produces.
//!
//! # Invariants
//! - Every record is identified by a store-assigned `TrollId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod troll;
