//! Platform Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Duplicate entity: {entity_type} with {field}={value}")]
    Duplicate { entity_type: String, field: String, value: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid payment state: payment {id} is {status}")]
    InvalidPaymentState { id: String, status: String },

    #[error("Illegal payment transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Matricule sequence exhausted for year prefix {year_prefix}")]
    SequenceExhausted { year_prefix: String },

    #[error("Invalid matricule: {0}")]
    InvalidMatricule(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PlatformError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(entity_type: impl Into<String>, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type: entity_type.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// True for conflicts and validation failures the caller can correct.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Duplicate { .. }
                | Self::Validation { .. }
                | Self::InvalidPaymentState { .. }
                | Self::InvalidTransition { .. }
                | Self::InvalidMatricule(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;
