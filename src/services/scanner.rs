//! Anomaly scanner
//!
//! Finds appointments whose recorded total is missing or zero, or that have
//! at least one line item with a missing or zero price. The store applies the
//! predicate as a prefilter and every returned row is checked again here after
//! the join. Missing services and clients are replaced by placeholders.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AgendaResult;
use crate::models::{AppointmentId, LineItemId, Money, ServiceId};
use crate::storage::{AppointmentFilter, AppointmentRecord, LineItemRecord, PriceStore};

pub const UNIDENTIFIED_CLIENT: &str = "unidentified client";
pub const UNIDENTIFIED_SERVICE: &str = "unidentified service";

/// A line item of a flagged appointment, annotated for repair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnomalousLineItem {
    pub line_item_id: LineItemId,
    pub service_id: Option<ServiceId>,
    /// Service name, or a placeholder when the service no longer resolves
    pub service_name: String,
    pub service_resolved: bool,
    pub final_price: Option<Money>,
    /// Catalog default at scan time; zero for unresolved services
    pub default_price: Money,
}

impl AnomalousLineItem {
    /// The recorded price when it is positive, else the catalog default
    pub fn suggested_price(&self) -> Money {
        match self.final_price {
            Some(price) if price.is_positive() => price,
            _ => self.default_price,
        }
    }

    pub fn has_missing_price(&self) -> bool {
        Money::is_missing(self.final_price)
    }
}

/// An appointment that breaks the zero/null price rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnomalousAppointment {
    pub appointment_id: AppointmentId,
    pub start_time: DateTime<Utc>,
    pub final_price: Option<Money>,
    /// Client name, or a placeholder when the client no longer resolves
    pub client_name: String,
    pub client_resolved: bool,
    pub line_items: Vec<AnomalousLineItem>,
}

impl AnomalousAppointment {
    /// Sum of the suggested prices
    pub fn suggested_total(&self) -> Money {
        self.line_items.iter().map(|li| li.suggested_price()).sum()
    }

    /// Whether any reference could not be resolved
    pub fn has_unresolved_references(&self) -> bool {
        !self.client_resolved || self.line_items.iter().any(|li| !li.service_resolved)
    }
}

impl From<AppointmentRecord> for AnomalousAppointment {
    fn from(record: AppointmentRecord) -> Self {
        let (client_name, client_resolved) = match record.client {
            Some(client) => (client.name, true),
            None => (UNIDENTIFIED_CLIENT.to_string(), false),
        };

        Self {
            appointment_id: record.appointment.id,
            start_time: record.appointment.start_time,
            final_price: record.appointment.final_price,
            client_name,
            client_resolved,
            line_items: record.line_items.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<LineItemRecord> for AnomalousLineItem {
    fn from(record: LineItemRecord) -> Self {
        let (service_name, default_price, service_resolved) = match record.service {
            Some(service) => (service.name, service.default_price, true),
            None => (UNIDENTIFIED_SERVICE.to_string(), Money::zero(), false),
        };

        Self {
            line_item_id: record.line_item.id,
            service_id: record.line_item.service_id,
            service_name,
            service_resolved,
            final_price: record.line_item.final_price,
            default_price,
        }
    }
}

/// Read-only scanner over a price store
pub struct AnomalyScanner<'a, S: PriceStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: PriceStore + ?Sized> AnomalyScanner<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// All anomalous appointments, earliest first.
    ///
    /// A store failure is returned as the single error; no partial list is
    /// produced.
    pub fn find_anomalous_appointments(&self) -> AgendaResult<Vec<AnomalousAppointment>> {
        let records = self
            .store
            .query_appointments(AppointmentFilter::PriceAnomaly)
            .inspect_err(|e| tracing::warn!(error = %e, "anomaly scan failed"))?;

        let prefiltered = records.len();
        let mut anomalies: Vec<AnomalousAppointment> = records
            .into_iter()
            .filter(|record| {
                record
                    .appointment
                    .has_price_anomaly(&record.raw_line_items())
            })
            .map(AnomalousAppointment::from)
            .collect();

        anomalies.sort_by_key(|a| a.start_time);

        tracing::debug!(prefiltered, flagged = anomalies.len(), "anomaly scan complete");
        Ok(anomalies)
    }

    pub fn count_anomalous(&self) -> AgendaResult<usize> {
        Ok(self.find_anomalous_appointments()?.len())
    }
}
