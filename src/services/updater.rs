//! Catalog price updater
//!
//! Changes service default prices one at a time or as a batch. A batch is
//! validated as a whole before anything is written; once writing starts each
//! service is independent, so a failed write is recorded and the rest of the
//! batch still goes through. Nothing is rolled back.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::error::{AgendaError, AgendaResult};
use crate::models::{is_acceptable_input, parse_price, Money, Service, ServiceId};
use crate::storage::PriceStore;

use super::catalog::PriceCatalog;

/// One requested change: a service (name or ID) and its new price text
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PriceChange {
    pub service: String,
    pub price: String,
}

impl PriceChange {
    pub fn new(service: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            price: price.into(),
        }
    }

    /// Parse `service=price`
    pub fn parse_assignment(s: &str) -> AgendaResult<Self> {
        let (service, price) = s.rsplit_once('=').ok_or_else(|| {
            AgendaError::Validation(format!("expected <service>=<price>, got '{}'", s))
        })?;
        Ok(Self::new(service.trim(), price.trim()))
    }
}

/// A batch entry that failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEntry {
    pub service: String,
    pub price: String,
    pub reason: String,
}

/// A write that failed after validation passed
#[derive(Debug)]
pub struct FailedUpdate {
    pub service: Service,
    pub price: Money,
    pub error: AgendaError,
}

/// What happened to each service in a validated batch
#[derive(Debug, Default)]
pub struct BatchUpdateReport {
    pub updated: Vec<Service>,
    /// Already at the requested price; not written
    pub unchanged: Vec<Service>,
    pub failed: Vec<FailedUpdate>,
}

impl BatchUpdateReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum BatchUpdateError {
    /// At least one entry was invalid; nothing was written
    #[error("price batch rejected ({} invalid); no prices were changed", .0.len())]
    Validation(Vec<InvalidEntry>),

    /// The catalog could not be read while validating
    #[error(transparent)]
    Store(#[from] AgendaError),
}

type SuccessHook<'a> = Box<dyn FnMut(&BatchUpdateReport) + 'a>;

/// Writes default prices through the catalog
pub struct CatalogPriceUpdater<'a, S: PriceStore + ?Sized> {
    catalog: PriceCatalog<'a, S>,
    on_success: Option<SuccessHook<'a>>,
}

impl<'a, S: PriceStore + ?Sized> CatalogPriceUpdater<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            catalog: PriceCatalog::new(store),
            on_success: None,
        }
    }

    /// Call `hook` after every batch in which every write succeeded
    pub fn with_success_hook(mut self, hook: impl FnMut(&BatchUpdateReport) + 'a) -> Self {
        self.on_success = Some(Box::new(hook));
        self
    }

    /// Update one service from operator text
    pub fn update_price(&self, service_id: ServiceId, input: &str) -> AgendaResult<Service> {
        let price = parse_input(input).map_err(AgendaError::Validation)?;
        self.update_price_amount(service_id, price)
    }

    /// Update one service. An unchanged price is not written again.
    pub fn update_price_amount(&self, service_id: ServiceId, price: Money) -> AgendaResult<Service> {
        let service = self
            .catalog
            .get(service_id)?
            .ok_or_else(|| AgendaError::service_not_found(service_id.to_string()))?;

        if service.default_price == price {
            tracing::debug!(service = %service.name, "price unchanged, skipping write");
            return Ok(service);
        }

        self.catalog.set_default_price(service_id, price)
    }

    /// Validate every change, then write them in order.
    ///
    /// A failed write does not stop the batch: default prices are independent
    /// of each other, so the remaining services are still written and the
    /// failure is listed in the report. Re-running the same batch retries only
    /// what failed, because unchanged prices are skipped.
    pub fn update_prices(
        &mut self,
        changes: &[PriceChange],
    ) -> Result<BatchUpdateReport, BatchUpdateError> {
        let validated = self.validate_batch(changes)?;
        let mut report = BatchUpdateReport::default();

        for (service, price) in validated {
            if service.default_price == price {
                report.unchanged.push(service);
                continue;
            }

            match self.catalog.set_default_price(service.id, price) {
                Ok(updated) => report.updated.push(updated),
                Err(error) => {
                    tracing::warn!(service = %service.name, error = %error, "batch price write failed");
                    report.failed.push(FailedUpdate {
                        service,
                        price,
                        error,
                    });
                }
            }
        }

        tracing::info!(
            updated = report.updated.len(),
            unchanged = report.unchanged.len(),
            failed = report.failed.len(),
            "price batch finished"
        );

        if report.is_complete() {
            if let Some(hook) = self.on_success.as_mut() {
                hook(&report);
            }
        }

        Ok(report)
    }

    fn validate_batch(
        &self,
        changes: &[PriceChange],
    ) -> Result<Vec<(Service, Money)>, BatchUpdateError> {
        let mut validated = Vec::with_capacity(changes.len());
        let mut invalid = Vec::new();
        let mut seen = HashSet::new();

        for change in changes {
            let reject = |reason: String| InvalidEntry {
                service: change.service.clone(),
                price: change.price.clone(),
                reason,
            };

            let price = match parse_input(&change.price) {
                Ok(price) => price,
                Err(reason) => {
                    invalid.push(reject(reason));
                    continue;
                }
            };

            match self.catalog.find(&change.service)? {
                Some(service) if !seen.insert(service.id) => {
                    invalid.push(reject("service listed more than once".to_string()));
                }
                Some(service) => validated.push((service, price)),
                None => invalid.push(reject("unknown service".to_string())),
            }
        }

        if invalid.is_empty() {
            Ok(validated)
        } else {
            tracing::warn!(invalid = invalid.len(), "price batch rejected");
            Err(BatchUpdateError::Validation(invalid))
        }
    }
}

/// Negative text is reported as negative; anything else outside the price
/// grammar as non-numeric
fn parse_input(input: &str) -> Result<Money, String> {
    let trimmed = input.trim();
    if !trimmed.starts_with('-') && !is_acceptable_input(trimmed) {
        return Err(format!("not a number: '{}'", trimmed));
    }
    parse_price(trimmed).map_err(|e| e.to_string())
}

/// Read `service,price` rows from a CSV file with a header line
pub fn read_price_file(path: &Path) -> AgendaResult<Vec<PriceChange>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| AgendaError::Import(format!("{}: {}", path.display(), e)))?;

    reader
        .deserialize()
        .enumerate()
        .map(|(i, row)| {
            row.map_err(|e| AgendaError::Import(format!("row {}: {}", i + 1, e)))
        })
        .collect()
}
