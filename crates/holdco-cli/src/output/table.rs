use serde_json::Value;
use tabled::{Table, builder::Builder};

/// Format the computation envelope as tables using the tabled crate.
pub fn print_table(value: &Value) {
    print!("{}", render_table(value));
}

fn render_table(value: &Value) -> String {
    let empty = serde_json::Map::new();
    let envelope = value.as_object().unwrap_or(&empty);
    let result = envelope.get("result").unwrap_or(value);
    let mut out = String::new();

    if let Some((headers, rows)) = super::tabular_rows(result) {
        out.push_str(&field_table(result, |v| !v.is_array() && !v.is_object()));
        let mut builder = Builder::default();
        builder.push_record(headers);
        for row in rows {
            builder.push_record(row);
        }
        out.push_str(&format!("{}\n", Table::from(builder)));
    } else if result.is_object() {
        out.push_str(&field_table(result, |_| true));
    } else {
        out.push_str(&format!("{}\n", format_value(result)));
    }

    // Print warnings if any
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            out.push_str("\nWarnings:\n");
            for w in warnings {
                if let Value::String(s) = w {
                    out.push_str(&format!("  - {}\n", s));
                }
            }
        }
    }

    // Print methodology
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        out.push_str(&format!("\nMethodology: {}\n", meth));
    }
    out
}

/// Two-column table of the result fields accepted by `keep`.
fn field_table(result: &Value, keep: impl Fn(&Value) -> bool) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    if let Value::Object(map) = result {
        for (key, val) in map.iter().filter(|(_, v)| keep(v)) {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
    }
    format!("{}\n", Table::from(builder))
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
