//! Service layer for agenda-pricing
//!
//! The pricing rules on top of any `PriceStore`: catalog reads and writes,
//! per-booking price selection, anomaly detection, repair, and batch catalog
//! updates.

pub mod catalog;
pub mod reconciliation;
pub mod scanner;
pub mod selector;
pub mod updater;

pub use catalog::{total_zero_price_count, PriceCatalog, ServiceWithStats};
pub use reconciliation::{
    InvalidPrice, ReconcileError, ReconcileOutcome, ReconcileSummary, ReconciliationEngine,
    RepairDraft, RepairState,
};
pub use scanner::{AnomalousAppointment, AnomalousLineItem, AnomalyScanner};
pub use selector::{BookingPriceSelector, ZERO_PRICE_WARNING};
pub use updater::{
    read_price_file, BatchUpdateError, BatchUpdateReport, CatalogPriceUpdater, FailedUpdate,
    InvalidEntry, PriceChange,
};
