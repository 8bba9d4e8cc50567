//! Display formatting for terminal output
//!
//! Plain-text tables and detail views for services, anomalies and quotes.

pub mod anomaly;
pub mod quote;
pub mod service;

pub use anomaly::{anomaly_report, format_anomaly_list, format_reconcile_summary, AnomalyReportRow};
pub use quote::format_quote;
pub use service::{format_batch_report, format_service_details, format_service_list};

use crate::models::Money;

/// Render a nullable recorded price
pub(crate) fn format_price(price: Option<Money>, symbol: &str) -> String {
    match price {
        Some(p) => p.format_with_symbol(symbol),
        None => "(none)".to_string(),
    }
}
