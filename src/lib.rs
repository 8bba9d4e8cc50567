//! agenda-pricing - price consistency for a service-business scheduler
//!
//! Appointments carry a recorded total and one line item per booked service.
//! This crate keeps those numbers honest: it finds appointments whose total
//! or line-item prices are missing or zero, repairs them so the total equals
//! the sum of the line items, and manages the catalog prices that new
//! bookings start from.
//!
//! # Architecture
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Services, clients, appointments, line items and `Money`
//! - `storage`: JSON file storage and the `PriceStore` boundary
//! - `services`: Catalog, booking selector, anomaly scanner, reconciliation
//!   engine and catalog price updater
//! - `audit`: Audit log of every price change
//! - `display`, `cli`: Terminal front end
//!
//! # Example
//!
//! ```rust,ignore
//! use agenda_pricing::config::paths::AgendaPaths;
//! use agenda_pricing::services::ReconciliationEngine;
//! use agenda_pricing::storage::Storage;
//!
//! let storage = Storage::new(AgendaPaths::new()?)?;
//! storage.load_all()?;
//! let mut engine = ReconciliationEngine::load(&storage)?;
//! let summary = engine.reconcile_all();
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{AgendaError, AgendaResult};
