use serde_json::Value;
use std::io;

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    if let Err(e) = write_csv(value, stdout.lock()) {
        eprintln!("CSV output error: {}", e);
    }
}

/// Rows when the result carries a ledger or schedule, two-column
/// `field,value` records otherwise.
fn write_csv<W: io::Write>(value: &Value, out: W) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(out);
    let result = value.get("result").unwrap_or(value);

    if let Some((headers, rows)) = super::tabular_rows(result) {
        wtr.write_record(&headers)?;
        for row in rows {
            wtr.write_record(&row)?;
        }
    } else if let Value::Object(fields) = result {
        wtr.write_record(["field", "value"])?;
        for (key, val) in fields {
            wtr.write_record([key.as_str(), &format_csv_value(val)])?;
        }
    } else {
        wtr.write_record([&format_csv_value(result)])?;
    }

    wtr.flush()?;
    Ok(())
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
