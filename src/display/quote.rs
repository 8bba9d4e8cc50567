//! Booking quote display formatting

use crate::models::{Money, Service};

/// Format the selected services of a booking with their prices
pub fn format_quote(
    lines: &[(Service, Money)],
    total: Money,
    warning: Option<&str>,
    symbol: &str,
) -> String {
    if lines.is_empty() {
        return "No services selected.".to_string();
    }

    let name_width = lines
        .iter()
        .map(|(s, _)| s.name.len())
        .max()
        .unwrap_or(5)
        .max(5);

    let mut output = String::new();
    for (service, price) in lines {
        let flag = if price.is_zero() { "  price not set" } else { "" };
        output.push_str(&format!(
            "{:<name_width$}  {:>12}{}\n",
            service.name,
            price.format_with_symbol(symbol),
            flag,
            name_width = name_width,
        ));
    }
    output.push_str(&format!("{:-<name_width$}  {:->12}\n", "", "", name_width = name_width));
    output.push_str(&format!(
        "{:<name_width$}  {:>12}\n",
        "Total",
        total.format_with_symbol(symbol),
        name_width = name_width,
    ));

    if let Some(warning) = warning {
        output.push_str(&format!("\nWarning: {}\n", warning));
    }

    output
}
