//! Diff generation for audit logging
//!
//! Produces a one-line summary of the top-level fields that changed between
//! two JSON snapshots. Price fields are stored in cents and rendered as
//! decimals; bookkeeping timestamps are left out.

use serde_json::Value;

/// Fields that change on every write and would only add noise
const IGNORED_FIELDS: &[&str] = &["updated_at"];

/// Generate a human-readable diff between two JSON values
pub fn generate_diff(before: &Value, after: &Value) -> Option<String> {
    let (Value::Object(before_obj), Value::Object(after_obj)) = (before, after) else {
        return (before != after)
            .then(|| format!("{} -> {}", format_value("", before), format_value("", after)));
    };

    let mut changes = Vec::new();

    for (key, before_val) in before_obj {
        if IGNORED_FIELDS.contains(&key.as_str()) {
            continue;
        }
        match after_obj.get(key) {
            Some(after_val) if after_val != before_val => changes.push(format!(
                "{}: {} -> {}",
                key,
                format_value(key, before_val),
                format_value(key, after_val)
            )),
            Some(_) => {}
            None => changes.push(format!(
                "{}: {} -> (removed)",
                key,
                format_value(key, before_val)
            )),
        }
    }

    for (key, after_val) in after_obj {
        if !before_obj.contains_key(key) && !IGNORED_FIELDS.contains(&key.as_str()) {
            changes.push(format!("{}: (added) -> {}", key, format_value(key, after_val)));
        }
    }

    if changes.is_empty() {
        None
    } else {
        Some(changes.join(", "))
    }
}

fn is_price_field(key: &str) -> bool {
    key.ends_with("price")
}

/// Format a JSON value for display; cent amounts in price fields become decimals
fn format_value(key: &str, value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Number(n) if is_price_field(key) => match n.as_i64() {
            Some(cents) => format!(
                "{}{}.{:02}",
                if cents < 0 { "-" } else { "" },
                (cents / 100).abs(),
                (cents % 100).abs()
            ),
            None => n.to_string(),
        },
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::String(s) if s.chars().count() > 50 => {
            format!("\"{}...\"", s.chars().take(47).collect::<String>())
        }
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_price_change_rendered_as_decimal() {
        let before = json!({"name": "Wash", "final_price": 0});
        let after = json!({"name": "Wash", "final_price": 1500});

        assert_eq!(
            generate_diff(&before, &after).as_deref(),
            Some("final_price: 0.00 -> 15.00")
        );
    }

    #[test]
    fn test_null_price_to_value() {
        let before = json!({"final_price": null});
        let after = json!({"final_price": 7000});

        assert_eq!(
            generate_diff(&before, &after).as_deref(),
            Some("final_price: null -> 70.00")
        );
    }

    #[test]
    fn test_updated_at_is_ignored() {
        let before = json!({"default_price": 4000, "updated_at": "2025-01-01T00:00:00Z"});
        let after = json!({"default_price": 4000, "updated_at": "2025-02-01T00:00:00Z"});

        assert!(generate_diff(&before, &after).is_none());
    }

    #[test]
    fn test_non_price_numbers_unchanged() {
        let before = json!({"duration_minutes": 30});
        let after = json!({"duration_minutes": 45});

        assert_eq!(
            generate_diff(&before, &after).as_deref(),
            Some("duration_minutes: 30 -> 45")
        );
    }

    #[test]
    fn test_added_and_removed_fields() {
        let before = json!({"name": "Test", "old": "x"});
        let after = json!({"name": "Test", "new": 1});

        let diff = generate_diff(&before, &after).unwrap();
        assert!(diff.contains("old: \"x\" -> (removed)"));
        assert!(diff.contains("new: (added) -> 1"));
    }

    #[test]
    fn test_long_string_truncation() {
        let before = json!({"name": "a".repeat(100)});
        let after = json!({"name": "short"});

        let diff = generate_diff(&before, &after).unwrap();
        assert!(diff.contains("...\""));
    }
}
