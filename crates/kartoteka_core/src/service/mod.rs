//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Run the caller-side validation step the store itself assumes.

pub mod card_service;
pub mod confirmation_service;
