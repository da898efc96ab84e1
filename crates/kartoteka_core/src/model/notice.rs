//! Summons notice projection.
//!
//! # Responsibility
//! - Carry the narrow read model consumed by document rendering.

use serde::{Deserialize, Serialize};

/// Read-only projection of one card for notice rendering.
///
/// Fetched by a single joined read; never written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub case_number: String,
    pub recipient_full_name: String,
    /// Epoch milliseconds.
    pub scheduled_date_time: i64,
    pub location: String,
    pub criminal_code_article: String,
    pub investigator: String,
    pub relation_to_event: String,
}
