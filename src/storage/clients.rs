//! Client repository for JSON storage
//!
//! Clients are read-only to the pricing tools; the repository only loads,
//! looks up and (for seeding) inserts.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::AgendaError;
use crate::models::{Client, ClientId};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub(crate) struct ClientData {
    pub(crate) clients: Vec<Client>,
}

/// Repository for client lookups
pub struct ClientRepository {
    path: PathBuf,
    data: RwLock<HashMap<ClientId, Client>>,
}

impl ClientRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load clients from disk
    pub fn load(&self) -> Result<(), AgendaError> {
        let file_data: ClientData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire write lock: {}", e))
        })?;

        *data = file_data
            .clients
            .into_iter()
            .map(|client| (client.id, client))
            .collect();

        Ok(())
    }

    /// Save clients to disk
    pub fn save(&self) -> Result<(), AgendaError> {
        let data = self.data.read().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut clients: Vec<_> = data.values().cloned().collect();
        clients.sort_by(|a, b| a.name.cmp(&b.name));
        write_json_atomic(&self.path, &ClientData { clients })
    }

    pub fn get(&self, id: ClientId) -> Result<Option<Client>, AgendaError> {
        let data = self.data.read().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(data.get(&id).cloned())
    }

    pub fn upsert(&self, client: Client) -> Result<(), AgendaError> {
        let mut data = self.data.write().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire write lock: {}", e))
        })?;
        data.insert(client.id, client);
        Ok(())
    }
}
