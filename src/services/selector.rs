//! Booking price selector
//!
//! Holds the per-booking price of every service the operator picked. Each
//! entry starts at the catalog default and can be overridden before the
//! booking is submitted. A zero price raises a warning but never blocks
//! submission; that decision belongs to the booking flow.

use crate::error::{AgendaError, AgendaResult};
use crate::models::{is_acceptable_input, parse_price, Money, ServiceId, MAX_PRICE};
use crate::storage::PriceStore;

use super::catalog::PriceCatalog;

/// Shown to the operator while any selected service is priced at zero
pub const ZERO_PRICE_WARNING: &str =
    "One or more selected services have no price set (0.00). Check the prices before booking.";

/// Override map for one booking, in selection order
pub struct BookingPriceSelector<'a, S: PriceStore + ?Sized> {
    catalog: PriceCatalog<'a, S>,
    overrides: Vec<(ServiceId, Money)>,
}

impl<'a, S: PriceStore + ?Sized> BookingPriceSelector<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            catalog: PriceCatalog::new(store),
            overrides: Vec::new(),
        }
    }

    /// Select a service at its current catalog default.
    ///
    /// Selecting an already selected service keeps its current override.
    pub fn select(&mut self, service_id: ServiceId) -> AgendaResult<Money> {
        if let Some(price) = self.override_for(service_id) {
            return Ok(price);
        }

        let price = self.catalog.get_default_price(service_id)?;
        self.overrides.push((service_id, price));
        Ok(price)
    }

    /// Drop a service from the booking. Returns whether it was selected.
    pub fn deselect(&mut self, service_id: ServiceId) -> bool {
        let before = self.overrides.len();
        self.overrides.retain(|(id, _)| *id != service_id);
        self.overrides.len() != before
    }

    /// Override a selected service's price with operator text
    pub fn set_override(&mut self, service_id: ServiceId, input: &str) -> AgendaResult<Money> {
        let trimmed = input.trim();
        // A leading '-' gets through so the operator is told "negative"
        if !trimmed.starts_with('-') && !is_acceptable_input(trimmed) {
            return Err(AgendaError::Validation(format!("not a number: '{}'", trimmed)));
        }

        let price = parse_price(trimmed).map_err(|e| AgendaError::Validation(e.to_string()))?;
        self.set_override_amount(service_id, price)
    }

    /// Override a selected service's price with an amount
    pub fn set_override_amount(&mut self, service_id: ServiceId, price: Money) -> AgendaResult<Money> {
        if price.is_negative() {
            return Err(AgendaError::Validation(format!(
                "price cannot be negative: {}",
                price
            )));
        }
        if price > MAX_PRICE {
            return Err(AgendaError::Validation(format!(
                "price is too large (maximum {}): {}",
                MAX_PRICE, price
            )));
        }

        let entry = self
            .overrides
            .iter_mut()
            .find(|(id, _)| *id == service_id)
            .ok_or_else(|| {
                AgendaError::Validation(format!("service {} is not selected", service_id))
            })?;
        entry.1 = price;
        Ok(price)
    }

    pub fn override_for(&self, service_id: ServiceId) -> Option<Money> {
        self.overrides
            .iter()
            .find(|(id, _)| *id == service_id)
            .map(|(_, price)| *price)
    }

    /// Selected services, in the order they were picked
    pub fn selected(&self) -> Vec<ServiceId> {
        self.overrides.iter().map(|(id, _)| *id).collect()
    }

    pub fn is_selected(&self, service_id: ServiceId) -> bool {
        self.override_for(service_id).is_some()
    }

    /// Whether any selected service currently resolves to exactly zero
    pub fn has_zero_price_selection(&self) -> bool {
        self.overrides.iter().any(|(_, price)| price.is_zero())
    }

    pub fn zero_price_services(&self) -> Vec<ServiceId> {
        self.overrides
            .iter()
            .filter(|(_, price)| price.is_zero())
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn total(&self) -> Money {
        self.overrides.iter().map(|(_, price)| *price).sum()
    }

    /// The warning to show, if any
    pub fn warning(&self) -> Option<&'static str> {
        self.has_zero_price_selection().then_some(ZERO_PRICE_WARNING)
    }

    /// Hand the final `(service, price)` lines to the booking flow
    pub fn into_lines(self) -> Vec<(ServiceId, Money)> {
        self.overrides
    }
}
