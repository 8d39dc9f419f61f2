//! Error types shared by the store, dice engine and projector

use thiserror::Error;

use crate::characters::{CharacterId, CharacterKind};

/// Rejected input. Nothing is mutated when one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("field {field} must be a {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },

    #[error("field {0} must be a finite number")]
    NonNumeric(String),

    #[error("invalid dice type {0}. Use d5, d10, d20, or d100")]
    UnsupportedDie(String),

    #[error("a die needs at least 2 faces, got {0}")]
    InvalidFaceCount(u32),

    #[error("field {0} is not editable here")]
    FieldNotEditable(String),

    #[error("field {field} does not apply to {kind} characters")]
    NotApplicable {
        field: &'static str,
        kind: CharacterKind,
    },

    #[error("request body must be a JSON object")]
    NotAnObject,
}

/// Failures surfaced by the character store and everything built on it
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("character {0} not found")]
    NotFound(CharacterId),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt character record {id}: {source}")]
    Corrupt {
        id: CharacterId,
        source: serde_json::Error,
    },
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
