//! Quote CLI command
//!
//! Prices a prospective booking the way the booking form does: each selected
//! service starts at its catalog price and can be overridden.

use crate::config::settings::Settings;
use crate::display::format_quote;
use crate::error::{AgendaError, AgendaResult};
use crate::services::{BookingPriceSelector, PriceCatalog, PriceChange};
use crate::storage::Storage;

/// Handle the quote command
pub fn handle_quote_command(
    storage: &Storage,
    settings: &Settings,
    services: &[String],
    prices: &[String],
) -> AgendaResult<()> {
    if services.is_empty() {
        return Err(AgendaError::Validation(
            "Select at least one service with --service".into(),
        ));
    }

    let catalog = PriceCatalog::new(storage);
    let mut selector = BookingPriceSelector::new(storage);

    for name in services {
        let service = catalog.require(name)?;
        selector.select(service.id)?;
    }

    for assignment in prices {
        let change = PriceChange::parse_assignment(assignment)?;
        let service = catalog.require(&change.service)?;
        selector.set_override(service.id, &change.price)?;
    }

    let warning = selector.warning();
    let total = selector.total();
    let mut lines = Vec::new();
    for (service_id, price) in selector.into_lines() {
        let service = catalog
            .get(service_id)?
            .ok_or_else(|| AgendaError::service_not_found(service_id.to_string()))?;
        lines.push((service, price));
    }

    print!(
        "{}",
        format_quote(&lines, total, warning, &settings.currency_symbol)
    );
    Ok(())
}
