//! Fix CLI commands
//!
//! Scan for appointments with missing prices and repair them.

use clap::{Subcommand, ValueEnum};

use crate::config::settings::Settings;
use crate::display::{anomaly_report, format_anomaly_list, format_reconcile_summary};
use crate::error::{AgendaError, AgendaResult};
use crate::services::{AnomalyScanner, ReconciliationEngine};
use crate::storage::Storage;

/// Output format for the anomaly report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

/// Fix subcommands
#[derive(Subcommand)]
pub enum FixCommands {
    /// List appointments with a missing or zero price
    Scan {
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Table)]
        format: ReportFormat,
    },
    /// Repair one appointment, using suggested prices unless overridden
    Apply {
        /// Appointment ID
        appointment: String,
        /// Price for one line item, as <service-or-item>=<price>
        #[arg(short, long = "price")]
        prices: Vec<String>,
    },
    /// Repair every flagged appointment with the suggested prices
    ApplyAll,
}

/// Handle a fix command
pub fn handle_fix_command(
    storage: &Storage,
    settings: &Settings,
    cmd: FixCommands,
) -> AgendaResult<()> {
    let symbol = settings.currency_symbol.as_str();

    match cmd {
        FixCommands::Scan { format } => {
            let anomalies = AnomalyScanner::new(storage).find_anomalous_appointments()?;
            match format {
                ReportFormat::Table => {
                    println!(
                        "{}",
                        format_anomaly_list(&anomalies, symbol, &settings.date_format)
                    );
                }
                ReportFormat::Json => {
                    let json = serde_json::to_string_pretty(&anomaly_report(&anomalies))
                        .map_err(|e| AgendaError::Export(e.to_string()))?;
                    println!("{}", json);
                }
                ReportFormat::Yaml => {
                    let yaml = serde_yaml::to_string(&anomaly_report(&anomalies))
                        .map_err(|e| AgendaError::Export(e.to_string()))?;
                    print!("{}", yaml);
                }
            }
        }
        FixCommands::Apply {
            appointment,
            prices,
        } => {
            let mut engine = ReconciliationEngine::load(storage)?;
            let draft = engine.find(&appointment).ok_or_else(|| {
                AgendaError::Validation(format!(
                    "Appointment '{}' has no missing prices (or does not exist)",
                    appointment
                ))
            })?;
            let appointment_id = draft.appointment_id();

            let mut assignments = Vec::new();
            for assignment in &prices {
                let (key, value) = assignment.rsplit_once('=').ok_or_else(|| {
                    AgendaError::Validation(format!(
                        "expected <service-or-item>=<price>, got '{}'",
                        assignment
                    ))
                })?;
                let line_item_id = draft.find_line_item(key).ok_or_else(|| {
                    AgendaError::Validation(format!("No line item matches '{}'", key.trim()))
                })?;
                assignments.push((line_item_id, key.trim().to_string(), value.trim().to_string()));
            }

            for (line_item_id, key, value) in assignments {
                let accepted = engine
                    .set_price_input(appointment_id, line_item_id, &value)
                    .map_err(|e| AgendaError::Reconciliation(e.to_string()))?;
                if !accepted {
                    return Err(AgendaError::Validation(format!(
                        "Price for {} must be a non-negative decimal, got '{}'",
                        key, value
                    )));
                }
            }

            match engine.reconcile(appointment_id) {
                Ok(outcome) => {
                    println!(
                        "Fixed {}: {} line item(s), total {}",
                        outcome.appointment_id,
                        outcome.line_items_written,
                        outcome.total.format_with_symbol(symbol)
                    );
                }
                Err(e) if e.is_transport() => {
                    return Err(AgendaError::Reconciliation(format!(
                        "{}. Run the same command again to retry.",
                        e
                    )));
                }
                Err(e) => return Err(AgendaError::Validation(e.to_string())),
            }
        }
        FixCommands::ApplyAll => {
            let mut engine = ReconciliationEngine::load(storage)?;
            if engine.pending().is_empty() {
                println!("No appointments with missing prices. Everything is in order.");
                return Ok(());
            }

            let summary = engine.reconcile_all();
            print!("{}", format_reconcile_summary(&summary, symbol));

            if !summary.failed.is_empty() {
                return Err(AgendaError::Reconciliation(format!(
                    "{} appointment(s) could not be fixed",
                    summary.failed.len()
                )));
            }
        }
    }

    Ok(())
}
