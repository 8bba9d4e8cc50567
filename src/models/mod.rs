//! Core data models for agenda-pricing
//!
//! This module contains the data structures of the pricing domain: catalog
//! services, clients, appointments and their line items, and the money and
//! price-input types shared by all of them.

pub mod appointment;
pub mod client;
pub mod ids;
pub mod money;
pub mod price;
pub mod service;

pub use appointment::{line_items_total, Appointment, AppointmentLineItem};
pub use client::Client;
pub use ids::{AppointmentId, ClientId, LineItemId, ServiceId};
pub use money::Money;
pub use price::{is_acceptable_input, parse_price, PriceInputError, MAX_PRICE};
pub use service::{Service, ServiceValidationError};
