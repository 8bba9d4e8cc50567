//! Anomaly and repair display formatting
//!
//! Text output for `fix scan` and `fix apply`, plus a serializable report
//! shape for JSON and YAML output. Prices in the report are decimal strings
//! so readers never have to know they are stored in cents.

use serde::Serialize;

use crate::services::{AnomalousAppointment, ReconcileSummary};

use super::format_price;

#[derive(Debug, Clone, Serialize)]
pub struct AnomalyReportLine {
    pub line_item: String,
    pub service: String,
    pub service_resolved: bool,
    pub recorded_price: Option<String>,
    pub default_price: String,
    pub suggested_price: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnomalyReportRow {
    pub appointment: String,
    pub start_time: String,
    pub client: String,
    pub client_resolved: bool,
    pub recorded_total: Option<String>,
    pub suggested_total: String,
    pub line_items: Vec<AnomalyReportLine>,
}

/// Build the machine-readable report
pub fn anomaly_report(anomalies: &[AnomalousAppointment]) -> Vec<AnomalyReportRow> {
    anomalies
        .iter()
        .map(|a| AnomalyReportRow {
            appointment: a.appointment_id.to_string(),
            start_time: a.start_time.to_rfc3339(),
            client: a.client_name.clone(),
            client_resolved: a.client_resolved,
            recorded_total: a.final_price.map(|p| p.to_decimal_string()),
            suggested_total: a.suggested_total().to_decimal_string(),
            line_items: a
                .line_items
                .iter()
                .map(|li| AnomalyReportLine {
                    line_item: li.line_item_id.to_string(),
                    service: li.service_name.clone(),
                    service_resolved: li.service_resolved,
                    recorded_price: li.final_price.map(|p| p.to_decimal_string()),
                    default_price: li.default_price.to_decimal_string(),
                    suggested_price: li.suggested_price().to_decimal_string(),
                })
                .collect(),
        })
        .collect()
}

/// Format flagged appointments for the terminal
pub fn format_anomaly_list(
    anomalies: &[AnomalousAppointment],
    symbol: &str,
    date_format: &str,
) -> String {
    if anomalies.is_empty() {
        return "No appointments with missing prices. Everything is in order.".to_string();
    }

    let mut output = format!("{} appointment(s) with missing prices\n", anomalies.len());

    for a in anomalies {
        let client_flag = if a.client_resolved { "" } else { " [?]" };
        output.push_str(&format!(
            "\n{}  {}  {}{}\n",
            a.appointment_id,
            a.start_time.format(date_format),
            a.client_name,
            client_flag
        ));
        output.push_str(&format!(
            "  recorded total: {:<12} suggested total: {}\n",
            format_price(a.final_price, symbol),
            a.suggested_total().format_with_symbol(symbol)
        ));

        let name_width = a
            .line_items
            .iter()
            .map(|li| li.service_name.len())
            .max()
            .unwrap_or(7)
            .max(7);

        for li in &a.line_items {
            let flag = if li.service_resolved { "" } else { " [?]" };
            output.push_str(&format!(
                "  {}  {:<name_width$}  recorded {:>10}  default {:>10}  suggested {:>10}{}\n",
                li.line_item_id,
                li.service_name,
                format_price(li.final_price, symbol),
                li.default_price.format_with_symbol(symbol),
                li.suggested_price().format_with_symbol(symbol),
                flag,
                name_width = name_width,
            ));
        }
    }

    if anomalies.iter().any(|a| a.has_unresolved_references()) {
        output.push_str("\n[?] client or service no longer exists\n");
    }

    output
}

/// Format the outcome of a repair run
pub fn format_reconcile_summary(summary: &ReconcileSummary, symbol: &str) -> String {
    let mut output = String::new();

    for outcome in &summary.reconciled {
        output.push_str(&format!(
            "  fixed    {}  total {}\n",
            outcome.appointment_id,
            outcome.total.format_with_symbol(symbol)
        ));
    }
    for id in &summary.skipped {
        output.push_str(&format!("  skipped  {}  total is zero\n", id));
    }
    for (id, error) in &summary.failed {
        output.push_str(&format!("  FAILED   {}  {}\n", id, error));
    }

    output.push_str(&format!(
        "{} fixed, {} skipped, {} failed\n",
        summary.reconciled.len(),
        summary.skipped.len(),
        summary.failed.len()
    ));

    output
}
