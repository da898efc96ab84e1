//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Multi-table card writes happen inside one transaction with a single
//!   commit point; no partial aggregate is ever visible to readers.
//! - Public identifiers cross into SQL only through the registry codec.

pub mod card_repo;
pub mod confirmation_repo;
pub mod notice_repo;
pub mod user_repo;
