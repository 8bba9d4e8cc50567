//! Storage layer for agenda-pricing
//!
//! JSON file storage with atomic writes and automatic directory creation.
//! `Storage` is the concrete `PriceStore` used by the CLI.

pub mod appointments;
pub mod clients;
pub mod file_io;
pub mod init;
pub mod services;
pub mod store;

pub use appointments::AppointmentRepository;
pub use clients::ClientRepository;
pub use file_io::{read_json, write_json_atomic};
pub use init::initialize_storage;
pub use services::ServiceRepository;
pub use store::{AppointmentFilter, AppointmentRecord, LineItemRecord, PriceStore};

use crate::audit::{AuditEntry, AuditLogger};
use crate::config::paths::AgendaPaths;
use crate::error::AgendaError;

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: AgendaPaths,
    pub services: ServiceRepository,
    pub clients: ClientRepository,
    pub appointments: AppointmentRepository,
    audit: AuditLogger,
    audit_enabled: bool,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: AgendaPaths) -> Result<Self, AgendaError> {
        paths.ensure_directories()?;

        Ok(Self {
            services: ServiceRepository::new(paths.services_file()),
            clients: ClientRepository::new(paths.clients_file()),
            appointments: AppointmentRepository::new(paths.appointments_file()),
            audit: AuditLogger::new(paths.audit_log()),
            audit_enabled: true,
            paths,
        })
    }

    /// Turn recording of price changes on or off
    pub fn with_audit(mut self, enabled: bool) -> Self {
        self.audit_enabled = enabled;
        self
    }

    pub fn paths(&self) -> &AgendaPaths {
        &self.paths
    }

    pub fn audit_log(&self) -> &AuditLogger {
        &self.audit
    }

    /// Load all data from disk
    pub fn load_all(&self) -> Result<(), AgendaError> {
        self.services.load()?;
        self.clients.load()?;
        self.appointments.load()?;
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> Result<(), AgendaError> {
        self.services.save()?;
        self.clients.save()?;
        self.appointments.save()?;
        Ok(())
    }

    /// Check if storage has been initialized
    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }

    /// Append to the audit log. The price write already happened, so a
    /// failure here is reported but not propagated.
    pub(crate) fn log_audit(&self, entry: &AuditEntry) {
        if !self.audit_enabled {
            return;
        }
        if let Err(e) = self.audit.log(entry) {
            tracing::warn!(error = %e, entity = %entry.entity_id, "failed to write audit entry");
        }
    }
}
