//! Appointment repository for JSON storage
//!
//! Appointments and their line items share appointments.json. Line items are
//! indexed by their owning appointment.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::AgendaError;
use crate::models::{Appointment, AppointmentId, AppointmentLineItem, LineItemId};

use super::file_io::{read_json, write_json_atomic};

/// Serializable appointment data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub(crate) struct AppointmentData {
    pub(crate) appointments: Vec<Appointment>,
    #[serde(default)]
    pub(crate) line_items: Vec<AppointmentLineItem>,
}

/// Repository for appointment persistence with a line-item index
pub struct AppointmentRepository {
    path: PathBuf,
    appointments: RwLock<HashMap<AppointmentId, Appointment>>,
    line_items: RwLock<HashMap<LineItemId, AppointmentLineItem>>,
    /// Index: appointment_id -> line_item_ids, in booking order
    by_appointment: RwLock<HashMap<AppointmentId, Vec<LineItemId>>>,
}

impl AppointmentRepository {
    /// Create a new appointment repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            appointments: RwLock::new(HashMap::new()),
            line_items: RwLock::new(HashMap::new()),
            by_appointment: RwLock::new(HashMap::new()),
        }
    }

    /// Load appointments and line items from disk and build the index
    pub fn load(&self) -> Result<(), AgendaError> {
        let file_data: AppointmentData = read_json(&self.path)?;

        let mut appointments = self.appointments.write().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut line_items = self.line_items.write().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_appointment = self.by_appointment.write().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire write lock: {}", e))
        })?;

        appointments.clear();
        line_items.clear();
        by_appointment.clear();

        for appointment in file_data.appointments {
            appointments.insert(appointment.id, appointment);
        }

        for item in file_data.line_items {
            by_appointment
                .entry(item.appointment_id)
                .or_default()
                .push(item.id);
            line_items.insert(item.id, item);
        }

        Ok(())
    }

    /// Save appointments and line items to disk
    pub fn save(&self) -> Result<(), AgendaError> {
        let appointments = self.get_all()?;

        let by_appointment = self.by_appointment.read().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire read lock: {}", e))
        })?;
        let items = self.line_items.read().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire read lock: {}", e))
        })?;

        // Written grouped by appointment so the file reads top to bottom
        let line_items: Vec<_> = appointments
            .iter()
            .flat_map(|apt| by_appointment.get(&apt.id).map(|v| v.as_slice()).unwrap_or(&[]))
            .filter_map(|id| items.get(id).cloned())
            .collect();

        write_json_atomic(
            &self.path,
            &AppointmentData {
                appointments,
                line_items,
            },
        )
    }

    /// Get an appointment by ID
    pub fn get(&self, id: AppointmentId) -> Result<Option<Appointment>, AgendaError> {
        let appointments = self.appointments.read().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(appointments.get(&id).cloned())
    }

    /// Get all appointments, earliest first
    pub fn get_all(&self) -> Result<Vec<Appointment>, AgendaError> {
        let appointments = self.appointments.read().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut result: Vec<_> = appointments.values().cloned().collect();
        result.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.created_at.cmp(&b.created_at)));
        Ok(result)
    }

    /// Get the line items of an appointment, in booking order
    pub fn line_items_for(
        &self,
        appointment_id: AppointmentId,
    ) -> Result<Vec<AppointmentLineItem>, AgendaError> {
        let line_items = self.line_items.read().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire read lock: {}", e))
        })?;
        let by_appointment = self.by_appointment.read().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire read lock: {}", e))
        })?;

        let ids = by_appointment
            .get(&appointment_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        Ok(ids.iter().filter_map(|id| line_items.get(id).cloned()).collect())
    }

    /// Get a line item by ID
    pub fn get_line_item(&self, id: LineItemId) -> Result<Option<AppointmentLineItem>, AgendaError> {
        let line_items = self.line_items.read().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(line_items.get(&id).cloned())
    }

    /// Insert or update an appointment
    pub fn upsert(&self, appointment: Appointment) -> Result<(), AgendaError> {
        let mut appointments = self.appointments.write().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire write lock: {}", e))
        })?;
        appointments.insert(appointment.id, appointment);
        Ok(())
    }

    /// Insert or update a line item
    pub fn upsert_line_item(&self, item: AppointmentLineItem) -> Result<(), AgendaError> {
        let mut line_items = self.line_items.write().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_appointment = self.by_appointment.write().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire write lock: {}", e))
        })?;

        if !line_items.contains_key(&item.id) {
            by_appointment
                .entry(item.appointment_id)
                .or_default()
                .push(item.id);
        }
        line_items.insert(item.id, item);
        Ok(())
    }

    /// Count appointments
    pub fn count(&self) -> Result<usize, AgendaError> {
        let appointments = self.appointments.read().map_err(|e| {
            AgendaError::Transport(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(appointments.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, ServiceId};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, AppointmentRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = AppointmentRepository::new(temp_dir.path().join("appointments.json"));
        (temp_dir, repo)
    }

    #[test]
    fn test_line_items_keep_booking_order() {
        let (_temp_dir, repo) = create_test_repo();
        let start = Utc.with_ymd_and_hms(2025, 5, 2, 9, 0, 0).unwrap();
        let apt = Appointment::new(None, start);
        repo.upsert(apt.clone()).unwrap();

        let wash = AppointmentLineItem::new(apt.id, Some(ServiceId::new()), Some(Money::zero()));
        let cut = AppointmentLineItem::new(apt.id, Some(ServiceId::new()), Some(Money::from_cents(5500)));
        repo.upsert_line_item(wash.clone()).unwrap();
        repo.upsert_line_item(cut.clone()).unwrap();

        // Updating must not duplicate the index entry
        let mut wash_updated = wash.clone();
        wash_updated.set_final_price(Money::from_cents(1500));
        repo.upsert_line_item(wash_updated).unwrap();

        let items = repo.line_items_for(apt.id).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, wash.id);
        assert_eq!(items[0].final_price, Some(Money::from_cents(1500)));
        assert_eq!(items[1].id, cut.id);
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        let start = Utc.with_ymd_and_hms(2025, 5, 2, 9, 0, 0).unwrap();
        let apt = Appointment::with_final_price(None, start, Money::from_cents(4000));
        let item = AppointmentLineItem::new(apt.id, None, Some(Money::from_cents(4000)));
        repo.upsert(apt.clone()).unwrap();
        repo.upsert_line_item(item.clone()).unwrap();
        repo.save().unwrap();

        let repo2 = AppointmentRepository::new(temp_dir.path().join("appointments.json"));
        repo2.load().unwrap();

        assert_eq!(repo2.get(apt.id).unwrap(), Some(apt.clone()));
        assert_eq!(repo2.line_items_for(apt.id).unwrap(), vec![item.clone()]);
        assert_eq!(repo2.get_line_item(item.id).unwrap(), Some(item));
        assert_eq!(repo2.count().unwrap(), 1);
    }

    #[test]
    fn test_get_all_sorted_by_start_time() {
        let (_temp_dir, repo) = create_test_repo();
        let late = Appointment::new(None, Utc.with_ymd_and_hms(2025, 5, 3, 9, 0, 0).unwrap());
        let early = Appointment::new(None, Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap());
        repo.upsert(late.clone()).unwrap();
        repo.upsert(early.clone()).unwrap();

        let ids: Vec<_> = repo.get_all().unwrap().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![early.id, late.id]);
    }
}
