//! Storage initialization
//!
//! Handles first-run setup and the optional demo dataset

use chrono::{DateTime, TimeZone, Utc};

use crate::config::paths::AgendaPaths;
use crate::error::AgendaError;
use crate::models::{
    Appointment, AppointmentLineItem, Client, ClientId, Money, Service, ServiceId,
};

use super::appointments::AppointmentData;
use super::clients::ClientData;
use super::file_io::write_json_atomic;
use super::services::ServiceData;

/// Initialize storage for a fresh installation
///
/// Creates the directories and empty data files. With `demo`, the files are
/// filled with a small salon dataset that contains every kind of price
/// anomaly. Existing data files are never overwritten.
pub fn initialize_storage(paths: &AgendaPaths, demo: bool) -> Result<(), AgendaError> {
    paths.ensure_directories()?;

    if !needs_initialization(paths) {
        return Ok(());
    }

    if demo {
        create_demo_data(paths)
    } else {
        write_json_atomic(paths.services_file(), &ServiceData::default())?;
        write_json_atomic(paths.clients_file(), &ClientData::default())?;
        write_json_atomic(paths.appointments_file(), &AppointmentData::default())
    }
}

/// Check if storage needs initialization
pub fn needs_initialization(paths: &AgendaPaths) -> bool {
    !paths.services_file().exists()
}

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, hour, minute, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

fn create_demo_data(paths: &AgendaPaths) -> Result<(), AgendaError> {
    let haircut = Service::new("Haircut", Money::from_cents(4000), 30);
    let wash = Service::new("Wash", Money::zero(), 15);
    let cut = Service::new("Cut", Money::from_cents(5500), 45);
    let color = Service::new("Color", Money::from_cents(8500), 90);
    let beard = Service::new("Beard Trim", Money::from_cents(2000), 20);

    let ana = Client::new("Ana Ruiz");
    let ben = Client::new("Ben Okafor");
    let chloe = Client::new("Chloe Martin");

    let mut appointments = Vec::new();
    let mut line_items = Vec::new();

    let mut book = |client: Option<ClientId>,
                    start: DateTime<Utc>,
                    total: Option<Money>,
                    items: &[(Option<ServiceId>, Option<Money>)]| {
        let mut appointment = Appointment::new(client, start);
        appointment.final_price = total;
        for (service_id, price) in items {
            line_items.push(AppointmentLineItem::new(appointment.id, *service_id, *price));
        }
        appointments.push(appointment);
    };

    // Zero total, one zero line item
    book(
        Some(ana.id),
        at(10, 9, 0),
        Some(Money::zero()),
        &[(Some(haircut.id), Some(Money::zero()))],
    );

    // Nonzero total hiding a zero line item
    book(
        Some(ben.id),
        at(11, 10, 30),
        Some(Money::from_cents(5500)),
        &[
            (Some(wash.id), Some(Money::zero())),
            (Some(cut.id), Some(Money::from_cents(5500))),
        ],
    );

    // Healthy
    book(
        Some(chloe.id),
        at(12, 14, 0),
        Some(Money::from_cents(7500)),
        &[
            (Some(cut.id), Some(Money::from_cents(5500))),
            (Some(beard.id), Some(Money::from_cents(2000))),
        ],
    );

    // Never priced; one service and the client no longer resolve
    book(
        Some(ClientId::new()),
        at(13, 11, 15),
        None,
        &[(Some(color.id), None), (Some(ServiceId::new()), None)],
    );

    // Healthy
    book(
        Some(ana.id),
        at(14, 16, 45),
        Some(Money::from_cents(4000)),
        &[(Some(haircut.id), Some(Money::from_cents(4000)))],
    );

    write_json_atomic(
        paths.services_file(),
        &ServiceData {
            services: vec![haircut, wash, cut, color, beard],
        },
    )?;
    write_json_atomic(
        paths.clients_file(),
        &ClientData {
            clients: vec![ana, ben, chloe],
        },
    )?;
    write_json_atomic(
        paths.appointments_file(),
        &AppointmentData {
            appointments,
            line_items,
        },
    )
}
