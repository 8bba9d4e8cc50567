//! The data store boundary used by the pricing services
//!
//! `PriceStore` exposes only row-level reads and writes plus one
//! predicate-based multi-row read. There is no multi-row transaction; callers
//! that write several rows must handle partial failure themselves.

use crate::audit::AuditEntry;
use crate::error::{AgendaError, AgendaResult};
use crate::models::{
    Appointment, AppointmentId, AppointmentLineItem, Client, LineItemId, Money, Service,
    ServiceId,
};

use super::Storage;

/// Row filter for `PriceStore::query_appointments`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentFilter {
    /// Every appointment
    All,
    /// Aggregate price null/zero, or at least one line item null/zero
    PriceAnomaly,
}

impl AppointmentFilter {
    pub fn matches(&self, appointment: &Appointment, line_items: &[AppointmentLineItem]) -> bool {
        match self {
            AppointmentFilter::All => true,
            AppointmentFilter::PriceAnomaly => appointment.has_price_anomaly(line_items),
        }
    }
}

/// A line item joined with its catalog service, if it still resolves
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemRecord {
    pub line_item: AppointmentLineItem,
    pub service: Option<Service>,
}

/// An appointment joined with its client and line items
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentRecord {
    pub appointment: Appointment,
    pub client: Option<Client>,
    pub line_items: Vec<LineItemRecord>,
}

impl AppointmentRecord {
    /// The bare line items, in booking order
    pub fn raw_line_items(&self) -> Vec<AppointmentLineItem> {
        self.line_items.iter().map(|r| r.line_item.clone()).collect()
    }
}

/// Row-level access to prices.
///
/// Every failure to read or write is reported as `AgendaError::Transport`
/// except a missing row, which is `AgendaError::NotFound`.
pub trait PriceStore {
    /// Appointments joined with line items, services and clients
    fn query_appointments(&self, filter: AppointmentFilter) -> AgendaResult<Vec<AppointmentRecord>>;

    /// Write one line item's charged price
    fn update_line_item_price(
        &self,
        id: LineItemId,
        price: Money,
    ) -> AgendaResult<AppointmentLineItem>;

    /// Write one appointment's recorded total
    fn update_appointment_price(&self, id: AppointmentId, price: Money) -> AgendaResult<Appointment>;

    fn get_service(&self, id: ServiceId) -> AgendaResult<Option<Service>>;

    /// All services, sorted by name
    fn list_services(&self) -> AgendaResult<Vec<Service>>;

    /// Write one service's default price
    fn update_service_price(&self, id: ServiceId, price: Money) -> AgendaResult<Service>;

    /// Record a completed price change. Stores without an audit trail ignore it.
    fn record_audit(&self, _entry: AuditEntry) {}
}

impl PriceStore for Storage {
    fn query_appointments(&self, filter: AppointmentFilter) -> AgendaResult<Vec<AppointmentRecord>> {
        let mut records = Vec::new();

        for appointment in self.appointments.get_all()? {
            let line_items = self.appointments.line_items_for(appointment.id)?;
            if !filter.matches(&appointment, &line_items) {
                continue;
            }

            let client = match appointment.client_id {
                Some(id) => self.clients.get(id)?,
                None => None,
            };

            let line_items = line_items
                .into_iter()
                .map(|line_item| {
                    let service = match line_item.service_id {
                        Some(id) => self.services.get(id)?,
                        None => None,
                    };
                    Ok(LineItemRecord { line_item, service })
                })
                .collect::<AgendaResult<Vec<_>>>()?;

            records.push(AppointmentRecord {
                appointment,
                client,
                line_items,
            });
        }

        tracing::debug!(?filter, count = records.len(), "queried appointments");
        Ok(records)
    }

    fn update_line_item_price(
        &self,
        id: LineItemId,
        price: Money,
    ) -> AgendaResult<AppointmentLineItem> {
        let before = self
            .appointments
            .get_line_item(id)?
            .ok_or_else(|| AgendaError::line_item_not_found(id.to_string()))?;

        let mut after = before.clone();
        after.set_final_price(price);
        self.appointments.upsert_line_item(after.clone())?;

        if let Err(e) = self.appointments.save() {
            self.appointments.upsert_line_item(before)?;
            return Err(e);
        }

        tracing::debug!(line_item = %id, price = %price, "line item price written");
        Ok(after)
    }

    fn update_appointment_price(&self, id: AppointmentId, price: Money) -> AgendaResult<Appointment> {
        let before = self
            .appointments
            .get(id)?
            .ok_or_else(|| AgendaError::appointment_not_found(id.to_string()))?;

        let mut after = before.clone();
        after.set_final_price(price);
        self.appointments.upsert(after.clone())?;

        if let Err(e) = self.appointments.save() {
            self.appointments.upsert(before)?;
            return Err(e);
        }

        tracing::debug!(appointment = %id, price = %price, "appointment total written");
        Ok(after)
    }

    fn get_service(&self, id: ServiceId) -> AgendaResult<Option<Service>> {
        self.services.get(id)
    }

    fn list_services(&self) -> AgendaResult<Vec<Service>> {
        self.services.get_all()
    }

    fn update_service_price(&self, id: ServiceId, price: Money) -> AgendaResult<Service> {
        let before = self
            .services
            .get(id)?
            .ok_or_else(|| AgendaError::service_not_found(id.to_string()))?;

        let mut after = before.clone();
        after.set_default_price(price);
        self.services.upsert(after.clone())?;

        if let Err(e) = self.services.save() {
            self.services.upsert(before)?;
            return Err(e);
        }

        tracing::debug!(service = %id, price = %price, "service default price written");
        Ok(after)
    }

    fn record_audit(&self, entry: AuditEntry) {
        self.log_audit(&entry);
    }
}
