//! Service catalog repository for JSON storage
//!
//! Manages loading and saving catalog services to services.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::AgendaError;
use crate::models::{Service, ServiceId};

use super::file_io::{read_json, write_json_atomic};

/// Serializable catalog data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub(crate) struct ServiceData {
    pub(crate) services: Vec<Service>,
}

/// Repository for catalog persistence
pub struct ServiceRepository {
    path: PathBuf,
    data: RwLock<HashMap<ServiceId, Service>>,
    /// Index: normalized name -> service_id
    by_name: RwLock<HashMap<String, ServiceId>>,
}

impl ServiceRepository {
    /// Create a new service repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_name: RwLock::new(HashMap::new()),
        }
    }

    /// Load services from disk
    pub fn load(&self) -> Result<(), AgendaError> {
        let file_data: ServiceData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_name = self.by_name.write().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        by_name.clear();

        for service in file_data.services {
            by_name.insert(Service::normalize_name(&service.name), service.id);
            data.insert(service.id, service);
        }

        Ok(())
    }

    /// Save services to disk
    pub fn save(&self) -> Result<(), AgendaError> {
        let services = self.get_all()?;
        write_json_atomic(&self.path, &ServiceData { services })
    }

    /// Get a service by ID
    pub fn get(&self, id: ServiceId) -> Result<Option<Service>, AgendaError> {
        let data = self.data.read().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(&id).cloned())
    }

    /// Get all services, sorted by name
    pub fn get_all(&self) -> Result<Vec<Service>, AgendaError> {
        let data = self.data.read().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut services: Vec<_> = data.values().cloned().collect();
        services.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(services)
    }

    /// Get a service by exact name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> Result<Option<Service>, AgendaError> {
        let data = self.data.read().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire read lock: {}", e))
        })?;
        let by_name = self.by_name.read().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(by_name
            .get(&Service::normalize_name(name))
            .and_then(|id| data.get(id).cloned()))
    }

    /// Insert or update a service
    pub fn upsert(&self, service: Service) -> Result<(), AgendaError> {
        let mut data = self.data.write().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_name = self.by_name.write().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire write lock: {}", e))
        })?;

        if let Some(old) = data.get(&service.id) {
            by_name.remove(&Service::normalize_name(&old.name));
        }
        by_name.insert(Service::normalize_name(&service.name), service.id);

        data.insert(service.id, service);
        Ok(())
    }

    /// Count services
    pub fn count(&self) -> Result<usize, AgendaError> {
        let data = self.data.read().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, ServiceRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = ServiceRepository::new(temp_dir.path().join("services.json"));
        (temp_dir, repo)
    }

    #[test]
    fn test_empty_load() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_get_by_name_is_case_insensitive() {
        let (_temp_dir, repo) = create_test_repo();
        repo.upsert(Service::new("Haircut", Money::from_cents(4000), 30))
            .unwrap();

        let found = repo.get_by_name("HAIRCUT").unwrap().unwrap();
        assert_eq!(found.name, "Haircut");
        assert!(repo.get_by_name("Wash").unwrap().is_none());
    }

    #[test]
    fn test_rename_updates_index() {
        let (_temp_dir, repo) = create_test_repo();
        let mut service = Service::new("Wash", Money::from_cents(1500), 15);
        repo.upsert(service.clone()).unwrap();

        service.name = "Shampoo".to_string();
        repo.upsert(service).unwrap();

        assert!(repo.get_by_name("Wash").unwrap().is_none());
        assert!(repo.get_by_name("shampoo").unwrap().is_some());
    }

    #[test]
    fn test_save_and_reload_sorted() {
        let (temp_dir, repo) = create_test_repo();
        repo.upsert(Service::new("Manicure", Money::from_cents(3000), 45))
            .unwrap();
        repo.upsert(Service::new("Cut", Money::from_cents(5500), 30))
            .unwrap();
        repo.save().unwrap();

        let repo2 = ServiceRepository::new(temp_dir.path().join("services.json"));
        repo2.load().unwrap();

        let names: Vec<_> = repo2.get_all().unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Cut", "Manicure"]);
    }
}
