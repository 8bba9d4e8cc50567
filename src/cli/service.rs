//! Service CLI commands
//!
//! Catalog listing and default price changes.

use std::cell::Cell;
use std::path::PathBuf;

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::{format_batch_report, format_service_details, format_service_list};
use crate::error::{AgendaError, AgendaResult};
use crate::services::{
    read_price_file, AnomalyScanner, BatchUpdateError, BatchUpdateReport, CatalogPriceUpdater,
    PriceCatalog, PriceChange,
};
use crate::storage::Storage;

/// Service subcommands
#[derive(Subcommand)]
pub enum ServiceCommands {
    /// List services with booking statistics
    List,
    /// Show service details
    Show {
        /// Service name or ID
        service: String,
    },
    /// Set one service's default price
    SetPrice {
        /// Service name or ID
        service: String,
        /// New price, e.g. 40 or 40.00
        price: String,
    },
    /// Set several default prices at once; nothing is written if any entry is invalid
    SetPrices {
        /// Changes as <service>=<price>
        changes: Vec<String>,
        /// CSV file with `service,price` columns
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Handle a service command
pub fn handle_service_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ServiceCommands,
) -> AgendaResult<()> {
    let catalog = PriceCatalog::new(storage);
    let symbol = settings.currency_symbol.as_str();

    match cmd {
        ServiceCommands::List => {
            let stats = catalog.list_with_stats()?;
            print!("{}", format_service_list(&stats, symbol));
            if stats.is_empty() {
                println!();
            }
        }
        ServiceCommands::Show { service } => {
            let found = catalog.require(&service)?;
            let stats = catalog
                .list_with_stats()?
                .into_iter()
                .find(|s| s.service.id == found.id)
                .ok_or_else(|| AgendaError::service_not_found(&service))?;
            print!("{}", format_service_details(&stats, symbol));
        }
        ServiceCommands::SetPrice { service, price } => {
            let found = catalog.require(&service)?;
            let updater = CatalogPriceUpdater::new(storage);
            let updated = updater.update_price(found.id, &price)?;

            if updated.default_price == found.default_price {
                println!(
                    "{} already costs {}",
                    updated.name,
                    updated.default_price.format_with_symbol(symbol)
                );
            } else {
                println!(
                    "{}: {} -> {}",
                    updated.name,
                    found.default_price.format_with_symbol(symbol),
                    updated.default_price.format_with_symbol(symbol)
                );
                if updated.has_zero_price() {
                    println!("Warning: {} now has no price.", updated.name);
                }
            }
        }
        ServiceCommands::SetPrices { changes, file } => {
            let mut batch = Vec::new();
            if let Some(path) = file {
                batch.extend(read_price_file(&path)?);
            }
            for change in &changes {
                batch.push(PriceChange::parse_assignment(change)?);
            }
            if batch.is_empty() {
                return Err(AgendaError::Validation(
                    "No price changes given. Use <service>=<price> or --file.".into(),
                ));
            }

            let remaining = Cell::new(None);
            let mut updater = CatalogPriceUpdater::new(storage).with_success_hook(|_| {
                remaining.set(AnomalyScanner::new(storage).count_anomalous().ok());
            });

            let report = match updater.update_prices(&batch) {
                Ok(report) => report,
                Err(BatchUpdateError::Validation(invalid)) => {
                    for entry in &invalid {
                        eprintln!("  {}={}: {}", entry.service, entry.price, entry.reason);
                    }
                    return Err(AgendaError::Validation(format!(
                        "{} invalid entr{}; no prices were changed",
                        invalid.len(),
                        if invalid.len() == 1 { "y" } else { "ies" }
                    )));
                }
                Err(BatchUpdateError::Store(e)) => return Err(e),
            };
            drop(updater);

            print!("{}", format_batch_report(&report, symbol));
            if let Some(count) = remaining.get() {
                println!("{} appointment(s) still have missing prices.", count);
            }

            if !report.is_complete() {
                return Err(batch_write_error(&report));
            }
        }
    }

    Ok(())
}

/// Name the services that were and were not saved by a partly failed batch
fn batch_write_error(report: &BatchUpdateReport) -> AgendaError {
    AgendaError::PartialWrite {
        failed: report.failed.iter().map(|f| f.service.name.clone()).collect(),
        saved: report.updated.iter().map(|s| s.name.clone()).collect(),
    }
}
