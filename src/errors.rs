use sea_orm::error::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;

/// Errors returned by the service layer.
///
/// Services validate their own invariants before touching the store, so
/// the constraint variants (`DuplicateName`, `ReferenceInUse`) are
/// normally produced by explicit pre-checks; the [`ServiceError::db`]
/// translation exists so that a constraint slipping through to the
/// database still surfaces as the same typed error instead of a raw
/// storage failure.
#[derive(Debug, Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    #[error("Reference in use: {0}")]
    ReferenceInUse(String),

    #[error("Insufficient quantity: requested {requested}, only {available} available")]
    InsufficientQuantity { requested: i32, available: i32 },

    #[error("Event error: {0}")]
    EventError(String),
}

impl ServiceError {
    /// Translates database constraint violations into their typed
    /// equivalents; everything else stays a `DatabaseError`.
    pub fn db(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => ServiceError::DuplicateName(msg),
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => ServiceError::ReferenceInUse(msg),
            _ => ServiceError::DatabaseError(err),
        }
    }

    pub fn not_found(what: impl std::fmt::Display) -> Self {
        ServiceError::NotFound(what.to_string())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ServiceError::ValidationError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_quantity_message_names_both_sides() {
        let err = ServiceError::InsufficientQuantity {
            requested: 5,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient quantity: requested 5, only 2 available"
        );
    }
}
