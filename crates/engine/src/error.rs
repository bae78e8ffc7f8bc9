//! The module contains the error the engine can throw.
//!
//! - [`Rejected`] thrown when an entry payload fails validation.
//! - [`Unauthenticated`] thrown when a bearer credential is missing or invalid.
//! - [`KeyNotFound`] thrown when an item is not found, or is not owned by the
//!   caller.
//!
//!  [`Rejected`]: EngineError::Rejected
//!  [`Unauthenticated`]: EngineError::Unauthenticated
//!  [`KeyNotFound`]: EngineError::KeyNotFound
use sea_orm::DbErr;
use thiserror::Error;

use crate::{IdentityError, Rejection};

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error(transparent)]
    Unauthenticated(#[from] IdentityError),
    #[error("{0} not found")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("password hashing failed: {0}")]
    Password(String),
    #[error("corrupted record: {0}")]
    Corrupted(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Rejected(a), Self::Rejected(b)) => a == b,
            (Self::Unauthenticated(a), Self::Unauthenticated(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidCredentials, Self::InvalidCredentials) => true,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::Password(a), Self::Password(b)) => a == b,
            (Self::Corrupted(a), Self::Corrupted(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
