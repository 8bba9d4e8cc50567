//! Custom error types for agenda-pricing
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for agenda-pricing operations
#[derive(Error, Debug)]
pub enum AgendaError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for operator input and data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Reading from or writing to the data store failed
    #[error("Data store error: {0}")]
    Transport(String),

    /// Some rows of a multi-row change were saved and others were not
    #[error("Could not save {}; {}", .failed.join(", "), saved_clause(.saved))]
    PartialWrite {
        failed: Vec<String>,
        saved: Vec<String>,
    },

    /// Reconciliation errors
    #[error("Reconciliation error: {0}")]
    Reconciliation(String),

    /// Report export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Batch price file errors
    #[error("Import error: {0}")]
    Import(String),
}

impl AgendaError {
    /// Create a "not found" error for services
    pub fn service_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Service",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for appointments
    pub fn appointment_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Appointment",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for appointment line items
    pub fn line_item_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Line item",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a data store failure
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::PartialWrite { .. })
    }

    /// Message suitable for the operator.
    ///
    /// Data store failures are collapsed to a generic message; the detail
    /// goes to the diagnostic log instead.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) => "Could not reach the data store; try again.".to_string(),
            other => other.to_string(),
        }
    }
}

fn saved_clause(saved: &[String]) -> String {
    if saved.is_empty() {
        "no other price was changed".to_string()
    } else {
        format!("these were saved: {}", saved.join(", "))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for AgendaError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AgendaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for agenda-pricing operations
pub type AgendaResult<T> = Result<T, AgendaError>;
