//! Client model

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::ClientId;

/// A client of the business. Only the name is used for pricing work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
}

impl Client {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ClientId::new(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
