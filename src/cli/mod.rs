//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod fix;
pub mod history;
pub mod quote;
pub mod service;

pub use fix::{handle_fix_command, FixCommands, ReportFormat};
pub use history::handle_history_command;
pub use quote::handle_quote_command;
pub use service::{handle_service_command, ServiceCommands};
