//! Card use-case service.
//!
//! # Responsibility
//! - Provide create/get/list/update/delete entry points for card callers.
//! - Run digit-format validation before every write; the repository
//!   assumes pre-validated input.
//!
//! # Invariants
//! - `create_card` returns the caller's card with the server-assigned
//!   registry number, creation date and initial status written back.
//! - Status is never written through this service; decline lives on the
//!   confirmation ledger.

use crate::model::card::{Card, CardStatus, CardValidationError};
use crate::repo::card_repo::{CardRepoError, CardRepoResult, CardRepository};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for card use-cases.
#[derive(Debug)]
pub enum CardServiceError {
    /// Caller-supplied input failed the digit-format checks.
    Validation(CardValidationError),
    /// Persistence-layer failure.
    Repo(CardRepoError),
}

impl Display for CardServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CardServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<CardValidationError> for CardServiceError {
    fn from(value: CardValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<CardRepoError> for CardServiceError {
    fn from(value: CardRepoError) -> Self {
        Self::Repo(value)
    }
}

/// Card service facade over repository implementations.
pub struct CardService<R: CardRepository> {
    repo: R,
}

impl<R: CardRepository> CardService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates and persists one new aggregate.
    ///
    /// Returns the input card with registry number, creation date and
    /// `InWork` status filled in.
    pub fn create_card(&mut self, mut card: Card) -> Result<Card, CardServiceError> {
        card.validate()?;
        let inserted = self.repo.insert_card(&card)?;
        card.basic_info.registry_number = inserted.registry_number;
        card.basic_info.creation_date = inserted.creation_date;
        card.basic_info.status = CardStatus::InWork;
        Ok(card)
    }

    /// Loads one aggregate by public registry number.
    pub fn get_card(&self, registry_number: &str) -> CardRepoResult<Card> {
        self.repo.get_card(registry_number)
    }

    /// Lists aggregates in one region.
    pub fn list_cards_by_region(&self, region: &str) -> CardRepoResult<Vec<Card>> {
        self.repo.list_cards_by_region(region)
    }

    /// Validates and rewrites the editable sections of one aggregate.
    pub fn update_card(
        &mut self,
        registry_number: &str,
        card: &Card,
    ) -> Result<(), CardServiceError> {
        card.validate()?;
        self.repo.update_card(registry_number, card)?;
        Ok(())
    }

    /// Permanently removes one aggregate.
    pub fn delete_card(&mut self, registry_number: &str) -> CardRepoResult<()> {
        self.repo.delete_card(registry_number)
    }
}
