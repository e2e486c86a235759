//! Table output formatting

use serde_json::{Map, Value};
use tabled::{
    Table, Tabled,
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Rows},
};

const EMPTY: &str = "No results found.";

/// Format typed rows as a table
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    if data.is_empty() {
        return EMPTY.to_string();
    }

    style(Table::new(data))
}

/// Format a backend payload as a table.
///
/// Arrays of records get one column per field (first-seen order), a single
/// record becomes FIELD/VALUE rows, anything else is printed as-is.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Array(items) if items.is_empty() => EMPTY.to_string(),
        Value::Array(items) => records_table(items),
        Value::Object(record) => record_table(record),
        other => cell_text(other),
    }
}

fn records_table(items: &[Value]) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for item in items {
        if let Value::Object(record) = item {
            for key in record.keys() {
                if !columns.contains(&key.as_str()) {
                    columns.push(key);
                }
            }
        }
    }

    let mut builder = Builder::default();
    if columns.is_empty() {
        builder.push_record(["VALUE"]);
        for item in items {
            builder.push_record([cell_text(item)]);
        }
    } else {
        builder.push_record(columns.iter().map(|c| c.to_string()));
        for item in items {
            let row = columns.iter().map(|column| match item {
                Value::Object(record) => record.get(*column).map(cell_text).unwrap_or_default(),
                other => cell_text(other),
            });
            builder.push_record(row);
        }
    }

    style(builder.build())
}

fn record_table(record: &Map<String, Value>) -> String {
    if record.is_empty() {
        return EMPTY.to_string();
    }

    let mut builder = Builder::default();
    builder.push_record(["FIELD", "VALUE"]);
    for (key, value) in record {
        builder.push_record([key.clone(), cell_text(value)]);
    }
    style(builder.build())
}

/// One-line rendering of a cell
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => format!("[{} items]", items.len()),
        other => other.to_string(),
    }
}

fn style(mut table: Table) -> String {
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Tabled)]
    struct TestRow {
        #[tabled(rename = "OPERATION")]
        name: String,
        #[tabled(rename = "KIND")]
        kind: String,
    }

    #[test]
    fn test_format_table_empty() {
        let items: Vec<TestRow> = vec![];
        assert_eq!(format_table(&items), "No results found.");
    }

    #[test]
    fn test_format_table_rows() {
        let items = vec![TestRow {
            name: "readAudit".to_string(),
            kind: "read".to_string(),
        }];

        let result = format_table(&items);
        assert!(result.contains("OPERATION"));
        assert!(result.contains("readAudit"));
        // Rounded style uses ╭ for top-left corner
        assert!(result.contains("╭"));
    }

    #[test]
    fn test_records_union_columns() {
        let result = format_value(&json!([
            {"kode": "BRG-1", "nama": "Toga"},
            {"kode": "BRG-2", "stok": 3},
        ]));

        for text in ["kode", "nama", "stok", "BRG-1", "Toga", "BRG-2", "3"] {
            assert!(result.contains(text), "missing {}", text);
        }
    }

    #[test]
    fn test_single_record_is_field_value() {
        let result = format_value(&json!({"totalBarang": 12, "items": [1, 2]}));

        assert!(result.contains("FIELD"));
        assert!(result.contains("totalBarang"));
        assert!(result.contains("[2 items]"));
    }

    #[test]
    fn test_scalars() {
        assert_eq!(format_value(&json!("ok")), "ok");
        assert_eq!(format_value(&json!([])), "No results found.");
        assert!(format_value(&json!([1, 2])).contains("VALUE"));
    }
}
