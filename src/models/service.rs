//! Service model
//!
//! A service is a catalog entry (e.g. "Haircut") with the canonical price and
//! duration used to seed new bookings and to suggest repairs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::ServiceId;
use super::money::Money;

/// A catalog service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Unique identifier
    pub id: ServiceId,

    /// Display name
    pub name: String,

    /// Canonical price for new bookings. Zero is allowed but flagged.
    pub default_price: Money,

    /// Duration in minutes
    pub duration_minutes: u32,

    /// When the service was created
    pub created_at: DateTime<Utc>,

    /// When the service was last modified
    pub updated_at: DateTime<Utc>,
}

impl Service {
    /// Create a new service
    pub fn new(name: impl Into<String>, default_price: Money, duration_minutes: u32) -> Self {
        let now = Utc::now();
        Self {
            id: ServiceId::new(),
            name: name.into(),
            default_price,
            duration_minutes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Change the canonical price
    pub fn set_default_price(&mut self, price: Money) {
        self.default_price = price;
        self.updated_at = Utc::now();
    }

    /// A zero default price is legal but almost always a configuration mistake
    pub fn has_zero_price(&self) -> bool {
        self.default_price.is_zero()
    }

    /// Normalize a service name for matching
    pub fn normalize_name(name: &str) -> String {
        name.trim().to_lowercase()
    }

    /// Validate the service
    pub fn validate(&self) -> Result<(), ServiceValidationError> {
        if self.name.trim().is_empty() {
            return Err(ServiceValidationError::EmptyName);
        }

        if self.default_price.is_negative() {
            return Err(ServiceValidationError::NegativePrice(self.default_price));
        }

        Ok(())
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Validation errors for services
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceValidationError {
    EmptyName,
    NegativePrice(Money),
}

impl fmt::Display for ServiceValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Service name cannot be empty"),
            Self::NegativePrice(price) => {
                write!(f, "Service price cannot be negative ({})", price)
            }
        }
    }
}

impl std::error::Error for ServiceValidationError {}
