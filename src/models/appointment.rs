//! Appointment and line item models
//!
//! An appointment carries a recorded total (`final_price`) and owns one line
//! item per booked service. Each line item records the price actually charged
//! for that occurrence, independent of the catalog's current default.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AppointmentId, ClientId, LineItemId, ServiceId};
use super::money::Money;

/// A booked appointment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    /// Unique identifier
    pub id: AppointmentId,

    /// Client reference (lookup only)
    pub client_id: Option<ClientId>,

    /// When the appointment starts
    pub start_time: DateTime<Utc>,

    /// Recorded total; `None` when the booking flow never set one
    pub final_price: Option<Money>,

    /// When the appointment was created
    pub created_at: DateTime<Utc>,

    /// When the appointment was last modified
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Create a new appointment without a recorded total
    pub fn new(client_id: Option<ClientId>, start_time: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: AppointmentId::new(),
            client_id,
            start_time,
            final_price: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an appointment with a recorded total
    pub fn with_final_price(
        client_id: Option<ClientId>,
        start_time: DateTime<Utc>,
        final_price: Money,
    ) -> Self {
        let mut appointment = Self::new(client_id, start_time);
        appointment.final_price = Some(final_price);
        appointment
    }

    /// Record a new total
    pub fn set_final_price(&mut self, price: Money) {
        self.final_price = Some(price);
        self.updated_at = Utc::now();
    }

    /// The recorded total is missing or zero
    pub fn has_missing_total(&self) -> bool {
        Money::is_missing(self.final_price)
    }

    /// Whether this appointment violates the zero/null price rule, either on
    /// its own total or on any of its line items
    pub fn has_price_anomaly(&self, line_items: &[AppointmentLineItem]) -> bool {
        self.has_missing_total() || line_items.iter().any(|li| li.has_missing_price())
    }

    /// Whether the recorded total equals the sum of the line items
    pub fn is_reconciled(&self, line_items: &[AppointmentLineItem]) -> bool {
        self.final_price == Some(line_items_total(line_items))
    }
}

impl fmt::Display for Appointment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.start_time.format("%Y-%m-%d %H:%M"))
    }
}

/// One service attached to one appointment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentLineItem {
    /// Unique identifier
    pub id: LineItemId,

    /// Owning appointment
    pub appointment_id: AppointmentId,

    /// Catalog service (weak reference; may dangle)
    pub service_id: Option<ServiceId>,

    /// Price charged for this occurrence
    pub final_price: Option<Money>,
}

impl AppointmentLineItem {
    /// Create a new line item
    pub fn new(
        appointment_id: AppointmentId,
        service_id: Option<ServiceId>,
        final_price: Option<Money>,
    ) -> Self {
        Self {
            id: LineItemId::new(),
            appointment_id,
            service_id,
            final_price,
        }
    }

    /// Record a new charged price
    pub fn set_final_price(&mut self, price: Money) {
        self.final_price = Some(price);
    }

    /// The charged price is missing or zero
    pub fn has_missing_price(&self) -> bool {
        Money::is_missing(self.final_price)
    }
}

/// Sum of the charged prices; missing prices count as zero
pub fn line_items_total(line_items: &[AppointmentLineItem]) -> Money {
    line_items
        .iter()
        .map(|li| li.final_price.unwrap_or_default())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_new_appointment_has_no_total() {
        let apt = Appointment::new(None, start());
        assert!(apt.final_price.is_none());
        assert!(apt.has_missing_total());
    }

    #[test]
    fn test_anomaly_on_zero_total() {
        let apt = Appointment::with_final_price(None, start(), Money::zero());
        let items = vec![AppointmentLineItem::new(
            apt.id,
            Some(ServiceId::new()),
            Some(Money::from_cents(4000)),
        )];
        assert!(apt.has_price_anomaly(&items));
    }

    #[test]
    fn test_anomaly_on_zero_line_item_with_nonzero_total() {
        let apt = Appointment::with_final_price(None, start(), Money::from_cents(5500));
        let items = vec![
            AppointmentLineItem::new(apt.id, None, Some(Money::zero())),
            AppointmentLineItem::new(apt.id, None, Some(Money::from_cents(5500))),
        ];
        assert!(apt.has_price_anomaly(&items));
    }

    #[test]
    fn test_anomaly_on_null_line_item() {
        let apt = Appointment::with_final_price(None, start(), Money::from_cents(100));
        let items = vec![AppointmentLineItem::new(apt.id, None, None)];
        assert!(apt.has_price_anomaly(&items));
    }

    #[test]
    fn test_no_anomaly_when_all_positive() {
        let apt = Appointment::with_final_price(None, start(), Money::from_cents(7000));
        let items = vec![
            AppointmentLineItem::new(apt.id, None, Some(Money::from_cents(1500))),
            AppointmentLineItem::new(apt.id, None, Some(Money::from_cents(5500))),
        ];
        assert!(!apt.has_price_anomaly(&items));
        assert!(apt.is_reconciled(&items));
    }

    #[test]
    fn test_line_items_total_treats_missing_as_zero() {
        let apt_id = AppointmentId::new();
        let items = vec![
            AppointmentLineItem::new(apt_id, None, None),
            AppointmentLineItem::new(apt_id, None, Some(Money::from_cents(250))),
        ];
        assert_eq!(line_items_total(&items).cents(), 250);
    }

    #[test]
    fn test_serialization_keeps_null_price() {
        let apt = Appointment::new(None, start());
        let json = serde_json::to_value(&apt).unwrap();
        assert!(json["final_price"].is_null());

        let back: Appointment = serde_json::from_value(json).unwrap();
        assert_eq!(back, apt);
    }
}
