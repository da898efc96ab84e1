//! Confirmation use-case service.
//!
//! # Responsibility
//! - Provide stable acknowledgement/decline entry points for core callers.
//! - Delegate persistence to the ledger repository.

use crate::model::card::Card;
use crate::model::user::UserSummary;
use crate::repo::card_repo::CardRepoResult;
use crate::repo::confirmation_repo::ConfirmationRepository;

/// Use-case service wrapper for the confirmation ledger.
pub struct ConfirmationService<R: ConfirmationRepository> {
    repo: R,
}

impl<R: ConfirmationRepository> ConfirmationService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Records that one user acknowledged one card.
    pub fn confirm(&self, user_id: i64, registry_number: &str) -> CardRepoResult<()> {
        self.repo.confirm(user_id, registry_number)
    }

    /// Moves one card to the terminal declined status.
    ///
    /// Idempotent; callers that care whether the card exists or was already
    /// declined must check first.
    pub fn decline(&self, card_id: i64) -> CardRepoResult<()> {
        self.repo.decline(card_id)
    }

    /// Lists the users that confirmed one card.
    pub fn users_by_card(&self, registry_number: &str) -> CardRepoResult<Vec<UserSummary>> {
        self.repo.users_by_card(registry_number)
    }

    /// Lists the aggregates confirmed by one user.
    pub fn cards_by_user(&self, user_email: &str) -> CardRepoResult<Vec<Card>> {
        self.repo.cards_by_user(user_email)
    }
}
