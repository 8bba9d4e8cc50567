//! Path management for agenda-pricing
//!
//! ## Path Resolution Order
//!
//! 1. `AGENDA_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/agenda-pricing` or `~/.config/agenda-pricing`
//! 3. Windows: `%APPDATA%\agenda-pricing`

use std::path::PathBuf;

use crate::error::AgendaError;

/// Environment variable that overrides the base directory
pub const DATA_DIR_ENV: &str = "AGENDA_DATA_DIR";

/// Manages all paths used by agenda-pricing
#[derive(Debug, Clone)]
pub struct AgendaPaths {
    base_dir: PathBuf,
}

impl AgendaPaths {
    /// Resolve the base directory from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, AgendaError> {
        let base_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(custom) if !custom.trim().is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Use an explicit base directory (tests, `--data-dir`)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Data directory (`<base>/data/`)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    pub fn services_file(&self) -> PathBuf {
        self.data_dir().join("services.json")
    }

    pub fn clients_file(&self) -> PathBuf {
        self.data_dir().join("clients.json")
    }

    /// Appointments and their line items live in one file
    pub fn appointments_file(&self) -> PathBuf {
        self.data_dir().join("appointments.json")
    }

    /// Ensure the base and data directories exist
    pub fn ensure_directories(&self) -> Result<(), AgendaError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| AgendaError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| AgendaError::Io(format!("Failed to create data directory: {}", e)))?;

        Ok(())
    }

    /// Initialized means a settings file has been written
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, AgendaError> {
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => {
            let home = std::env::var("HOME").map_err(|_| {
                AgendaError::Config("HOME environment variable not set".into())
            })?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("agenda-pricing"))
}

#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, AgendaError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| AgendaError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("agenda-pricing"))
}
