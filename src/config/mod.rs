//! Configuration module for agenda-pricing
//!
//! - XDG-compliant path resolution
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::AgendaPaths;
pub use settings::Settings;
