pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Columns shown when a projection ledger is rendered as rows.
/// Dotted names reach into the nested exit valuations.
const LEDGER_COLUMNS: [&str; 16] = [
    "year",
    "gross_rent",
    "interest",
    "principal_repaid",
    "depreciation",
    "taxable_result",
    "corporate_tax",
    "capital_injection",
    "advance_repayment",
    "dividends_paid",
    "net_investor_cash_flow",
    "treasury",
    "shareholder_advance_balance",
    "remaining_loan_balance",
    "asset_sale.irr",
    "share_sale.irr",
];

const LEDGER_SEPARATOR: &str = "---";

/// Ledger rows of a projection result, or rows of an amortization schedule.
/// Returns `None` when the result carries neither.
pub fn tabular_rows(result: &Value) -> Option<(Vec<String>, Vec<Vec<String>>)> {
    if let Some(Value::Array(entries)) = result.get("entries") {
        let headers = LEDGER_COLUMNS.iter().map(|c| c.to_string()).collect();
        let rows = entries
            .iter()
            .map(|entry| match entry.get("kind").and_then(Value::as_str) {
                Some("year") => LEDGER_COLUMNS
                    .iter()
                    .map(|column| lookup(entry, column).map(scalar).unwrap_or_default())
                    .collect(),
                _ => vec![LEDGER_SEPARATOR.to_string(); LEDGER_COLUMNS.len()],
            })
            .collect();
        return Some((headers, rows));
    }

    if let Some(Value::Array(years)) = result.get("years") {
        let Some(Value::Object(first)) = years.first() else {
            return None;
        };
        let headers: Vec<String> = first.keys().cloned().collect();
        let rows = years
            .iter()
            .map(|y| {
                headers
                    .iter()
                    .map(|h| y.get(h.as_str()).map(scalar).unwrap_or_default())
                    .collect()
            })
            .collect();
        return Some((headers, rows));
    }

    None
}

fn lookup<'a>(value: &'a Value, dotted: &str) -> Option<&'a Value> {
    dotted.split('.').try_fold(value, |v, key| v.get(key))
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ledger_rows_with_separator() {
        let result = json!({
            "entries": [
                {"kind": "year", "year": 1, "treasury": "120.5", "share_sale": {"irr": "0.04"}},
                {"kind": "loan_paid_off", "after_year": 1},
                {"kind": "year", "year": 2, "treasury": "300"}
            ]
        });
        let (headers, rows) = tabular_rows(&result).unwrap();
        assert_eq!(headers.len(), LEDGER_COLUMNS.len());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], "1");
        assert_eq!(rows[0][11], "120.5");
        assert_eq!(rows[0][15], "0.04");
        assert!(rows[1].iter().all(|cell| cell == LEDGER_SEPARATOR));
        assert_eq!(rows[2][15], "");
    }

    #[test]
    fn test_schedule_rows() {
        let result = json!({
            "monthly_payment": "1066.19",
            "years": [{"year": 1, "interest": "794.22", "principal": "12000", "remaining_balance": "0"}]
        });
        let (headers, rows) = tabular_rows(&result).unwrap();
        assert_eq!(headers.len(), 4);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_plain_result_has_no_rows() {
        assert!(tabular_rows(&json!({"tax": "6375"})).is_none());
    }
}
