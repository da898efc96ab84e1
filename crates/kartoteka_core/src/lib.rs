//! Core domain logic for the summons card registry.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod registry;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::card::{
    BasicInfo, BusinessDetails, Card, CardStatus, CardValidationError, CaseDetails,
    DefenderDetails, InvestigationDetails, OrganizerDetails, PersonDetails,
};
pub use model::notice::Notice;
pub use model::user::{NewUser, User, UserSummary};
pub use registry::{decode_registry_number, encode_registry_number, RegistryNumberError};
pub use repo::card_repo::{
    CardRepoError, CardRepoResult, CardRepository, InsertedCard, SqliteCardRepository,
};
pub use repo::confirmation_repo::{ConfirmationRepository, SqliteConfirmationRepository};
pub use repo::notice_repo::{NoticeRepository, SqliteNoticeRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepoError, UserRepoResult, UserRepository};
pub use service::card_service::{CardService, CardServiceError};
pub use service::confirmation_service::ConfirmationService;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
