//! Service catalog display formatting

use crate::services::{total_zero_price_count, BatchUpdateReport, ServiceWithStats};

/// Format the catalog as a table with booking statistics
pub fn format_service_list(stats: &[ServiceWithStats], symbol: &str) -> String {
    if stats.is_empty() {
        return "No services found.".to_string();
    }

    let name_width = stats
        .iter()
        .map(|s| s.service.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:>8}  {:>12}  {:>6}  {:>10}\n",
        "Name",
        "Duration",
        "Price",
        "Booked",
        "Zero-price",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:->8}  {:->12}  {:->6}  {:->10}\n",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for s in stats {
        let marker = if s.service.has_zero_price() { "  !" } else { "" };
        output.push_str(&format!(
            "{:<name_width$}  {:>8}  {:>12}  {:>6}  {:>10}{}\n",
            s.service.name,
            format!("{} min", s.service.duration_minutes),
            s.service.default_price.format_with_symbol(symbol),
            s.line_items_count,
            s.zero_price_count,
            marker,
            name_width = name_width,
        ));
    }

    let zero_total = total_zero_price_count(stats);
    if zero_total > 0 {
        output.push_str(&format!(
            "\n{} booked line item(s) have no price. Run 'agenda fix scan' to review them.\n",
            zero_total
        ));
    }

    output
}

/// Format a single service's details
pub fn format_service_details(stats: &ServiceWithStats, symbol: &str) -> String {
    let service = &stats.service;
    let mut output = String::new();

    output.push_str(&format!("Service: {}\n", service.name));
    output.push_str(&format!("  ID:             {}\n", service.id));
    output.push_str(&format!(
        "  Default price:  {}{}\n",
        service.default_price.format_with_symbol(symbol),
        if service.has_zero_price() { " (not set)" } else { "" }
    ));
    output.push_str(&format!("  Duration:       {} min\n", service.duration_minutes));
    output.push_str(&format!("  Booked:         {}\n", stats.line_items_count));
    output.push_str(&format!("  Without price:  {}\n", stats.zero_price_count));
    output.push_str(&format!(
        "  Updated:        {}\n",
        service.updated_at.format("%Y-%m-%d %H:%M")
    ));

    output
}

/// Summarize a batch of catalog price updates
pub fn format_batch_report(report: &BatchUpdateReport, symbol: &str) -> String {
    let mut output = String::new();

    for service in &report.updated {
        output.push_str(&format!(
            "  updated    {:<20} {}\n",
            service.name,
            service.default_price.format_with_symbol(symbol)
        ));
    }
    for service in &report.unchanged {
        output.push_str(&format!(
            "  unchanged  {:<20} {}\n",
            service.name,
            service.default_price.format_with_symbol(symbol)
        ));
    }
    for failed in &report.failed {
        output.push_str(&format!(
            "  FAILED     {:<20} {}  ({})\n",
            failed.service.name,
            failed.price.format_with_symbol(symbol),
            failed.error.user_message()
        ));
    }

    output.push_str(&format!(
        "{} updated, {} unchanged, {} failed\n",
        report.updated.len(),
        report.unchanged.len(),
        report.failed.len()
    ));

    if !report.is_complete() {
        output.push_str("Run the same batch again to retry the failed services.\n");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, Service};

    fn stats(name: &str, cents: i64, booked: usize, zero: usize) -> ServiceWithStats {
        ServiceWithStats {
            service: Service::new(name, Money::from_cents(cents), 30),
            line_items_count: booked,
            zero_price_count: zero,
        }
    }

    #[test]
    fn test_service_list_flags_zero_prices() {
        let output = format_service_list(
            &[stats("Haircut", 4000, 3, 1), stats("Wash", 0, 2, 2)],
            "$",
        );

        assert!(output.contains("Haircut"));
        assert!(output.contains("$40.00"));
        assert!(output.contains("3 booked line item(s) have no price"));
        let wash_line = output.lines().find(|l| l.starts_with("Wash")).unwrap();
        assert!(wash_line.ends_with('!'));
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(format_service_list(&[], "$"), "No services found.");
    }

    #[test]
    fn test_service_details() {
        let output = format_service_details(&stats("Wash", 0, 2, 2), "R$");
        assert!(output.contains("Service: Wash"));
        assert!(output.contains("R$0.00 (not set)"));
        assert!(output.contains("Without price:  2"));
    }
}
