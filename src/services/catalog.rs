//! Price catalog service
//!
//! Read access to each service's canonical default price and duration, plus
//! the one write path for default prices. Changing a default never touches
//! prices already recorded on appointments.

use std::collections::HashMap;

use crate::audit::{AuditEntry, EntityType, Operation};
use crate::error::{AgendaError, AgendaResult};
use crate::models::{Money, Service, ServiceId, MAX_PRICE};
use crate::storage::{AppointmentFilter, PriceStore};

/// A catalog service with booking statistics
#[derive(Debug, Clone)]
pub struct ServiceWithStats {
    pub service: Service,
    /// Line items booked against this service
    pub line_items_count: usize,
    /// Of those, how many have a missing or zero charged price
    pub zero_price_count: usize,
}

/// Service for catalog lookups and default price changes
pub struct PriceCatalog<'a, S: PriceStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: PriceStore + ?Sized> PriceCatalog<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Get a service by ID
    pub fn get(&self, id: ServiceId) -> AgendaResult<Option<Service>> {
        self.store.get_service(id)
    }

    /// Current default price of a service
    pub fn get_default_price(&self, id: ServiceId) -> AgendaResult<Money> {
        self.store
            .get_service(id)?
            .map(|s| s.default_price)
            .ok_or_else(|| AgendaError::service_not_found(id.to_string()))
    }

    /// Change the default price of a service
    pub fn set_default_price(&self, id: ServiceId, price: Money) -> AgendaResult<Service> {
        if price.is_negative() {
            return Err(AgendaError::Validation(format!(
                "Service price cannot be negative ({})",
                price
            )));
        }
        if price > MAX_PRICE {
            return Err(AgendaError::Validation(format!(
                "Service price cannot exceed {} ({})",
                MAX_PRICE, price
            )));
        }

        let before = self
            .store
            .get_service(id)?
            .ok_or_else(|| AgendaError::service_not_found(id.to_string()))?;

        let updated = self.store.update_service_price(id, price)?;

        self.store.record_audit(AuditEntry::change(
            Operation::Update,
            EntityType::Service,
            id.to_string(),
            Some(updated.name.clone()),
            &before,
            &updated,
        ));

        tracing::info!(
            service = %updated.name,
            from = %before.default_price,
            to = %updated.default_price,
            "default price updated"
        );
        Ok(updated)
    }

    /// List all services, sorted by name
    pub fn list(&self) -> AgendaResult<Vec<Service>> {
        self.store.list_services()
    }

    /// Find a service by name (case-insensitive) or ID
    pub fn find(&self, identifier: &str) -> AgendaResult<Option<Service>> {
        let services = self.store.list_services()?;
        let normalized = Service::normalize_name(identifier);

        if let Some(service) = services
            .iter()
            .find(|s| Service::normalize_name(&s.name) == normalized)
        {
            return Ok(Some(service.clone()));
        }

        Ok(services.into_iter().find(|s| s.id.matches(identifier)))
    }

    /// Find a service or fail with a not-found error
    pub fn require(&self, identifier: &str) -> AgendaResult<Service> {
        self.find(identifier)?
            .ok_or_else(|| AgendaError::service_not_found(identifier))
    }

    /// All services with how often they are booked and how many of those
    /// bookings carry a missing or zero price
    pub fn list_with_stats(&self) -> AgendaResult<Vec<ServiceWithStats>> {
        let mut counts: HashMap<ServiceId, (usize, usize)> = HashMap::new();

        for record in self.store.query_appointments(AppointmentFilter::All)? {
            for item in &record.line_items {
                if let Some(service_id) = item.line_item.service_id {
                    let entry = counts.entry(service_id).or_default();
                    entry.0 += 1;
                    if item.line_item.has_missing_price() {
                        entry.1 += 1;
                    }
                }
            }
        }

        Ok(self
            .store
            .list_services()?
            .into_iter()
            .map(|service| {
                let (line_items_count, zero_price_count) =
                    counts.get(&service.id).copied().unwrap_or_default();
                ServiceWithStats {
                    service,
                    line_items_count,
                    zero_price_count,
                }
            })
            .collect())
    }
}

/// Total of the per-service zero-price counts
pub fn total_zero_price_count(stats: &[ServiceWithStats]) -> usize {
    stats.iter().map(|s| s.zero_price_count).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::AgendaPaths;
    use crate::models::{Appointment, AppointmentLineItem};
    use crate::storage::Storage;
    use chrono::Utc;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = AgendaPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        (temp_dir, storage)
    }

    fn add_service(storage: &Storage, name: &str, cents: i64) -> Service {
        let service = Service::new(name, Money::from_cents(cents), 30);
        storage.services.upsert(service.clone()).unwrap();
        service
    }

    #[test]
    fn test_get_default_price() {
        let (_temp, storage) = create_test_storage();
        let haircut = add_service(&storage, "Haircut", 4000);
        let catalog = PriceCatalog::new(&storage);

        assert_eq!(
            catalog.get_default_price(haircut.id).unwrap(),
            Money::from_cents(4000)
        );
        assert!(catalog
            .get_default_price(ServiceId::new())
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_set_default_price_rejects_negative() {
        let (_temp, storage) = create_test_storage();
        let haircut = add_service(&storage, "Haircut", 4000);
        let catalog = PriceCatalog::new(&storage);

        let err = catalog
            .set_default_price(haircut.id, Money::from_cents(-500))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(
            catalog.get_default_price(haircut.id).unwrap(),
            Money::from_cents(4000)
        );
    }

    #[test]
    fn test_set_default_price_rejects_amount_above_maximum() {
        let (_temp, storage) = create_test_storage();
        let haircut = add_service(&storage, "Haircut", 4000);
        let catalog = PriceCatalog::new(&storage);

        let err = catalog
            .set_default_price(haircut.id, Money::from_cents(i64::MAX))
            .unwrap_err();
        assert!(err.is_validation());
        assert!(catalog.set_default_price(haircut.id, MAX_PRICE).is_ok());
    }

    #[test]
    fn test_set_default_price_leaves_appointments_alone() {
        let (_temp, storage) = create_test_storage();
        let haircut = add_service(&storage, "Haircut", 4000);
        let appointment =
            Appointment::with_final_price(None, Utc::now(), Money::from_cents(4000));
        let item = AppointmentLineItem::new(
            appointment.id,
            Some(haircut.id),
            Some(Money::from_cents(4000)),
        );
        storage.appointments.upsert(appointment.clone()).unwrap();
        storage.appointments.upsert_line_item(item.clone()).unwrap();

        let catalog = PriceCatalog::new(&storage);
        let updated = catalog
            .set_default_price(haircut.id, Money::from_cents(4500))
            .unwrap();

        assert_eq!(updated.default_price, Money::from_cents(4500));
        assert_eq!(
            catalog.get_default_price(haircut.id).unwrap(),
            Money::from_cents(4500)
        );
        let stored = storage.appointments.get_line_item(item.id).unwrap().unwrap();
        assert_eq!(stored.final_price, Some(Money::from_cents(4000)));
        assert_eq!(storage.audit_log().read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_find_by_name_or_id() {
        let (_temp, storage) = create_test_storage();
        let wash = add_service(&storage, "Wash", 0);
        let catalog = PriceCatalog::new(&storage);

        assert_eq!(catalog.find("  WASH ").unwrap().map(|s| s.id), Some(wash.id));
        assert_eq!(
            catalog.find(&wash.id.to_string()).unwrap().map(|s| s.id),
            Some(wash.id)
        );
        assert!(catalog.find("Massage").unwrap().is_none());
        assert!(catalog.require("Massage").unwrap_err().is_not_found());
    }

    #[test]
    fn test_list_with_stats() {
        let (_temp, storage) = create_test_storage();
        let wash = add_service(&storage, "Wash", 0);
        let cut = add_service(&storage, "Cut", 5500);

        let appointment =
            Appointment::with_final_price(None, Utc::now(), Money::from_cents(5500));
        storage.appointments.upsert(appointment.clone()).unwrap();
        for (service, price) in [(wash.id, Money::zero()), (cut.id, Money::from_cents(5500))] {
            storage
                .appointments
                .upsert_line_item(AppointmentLineItem::new(
                    appointment.id,
                    Some(service),
                    Some(price),
                ))
                .unwrap();
        }

        let catalog = PriceCatalog::new(&storage);
        let stats = catalog.list_with_stats().unwrap();

        assert_eq!(stats.len(), 2);
        let cut_stats = stats.iter().find(|s| s.service.id == cut.id).unwrap();
        assert_eq!((cut_stats.line_items_count, cut_stats.zero_price_count), (1, 0));
        let wash_stats = stats.iter().find(|s| s.service.id == wash.id).unwrap();
        assert_eq!((wash_stats.line_items_count, wash_stats.zero_price_count), (1, 1));
        assert_eq!(total_zero_price_count(&stats), 1);
    }
}
