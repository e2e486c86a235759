//! Output formatting for CLI results

use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::Result;

pub mod formatters;
pub mod json;
pub mod table;

/// Trait for types that can be formatted for output
pub trait Formattable {
    /// Format the data according to the specified format
    fn format(&self, format: OutputFormat) -> Result<String>;
}

/// Backend payloads: pretty JSON, a table when the shape allows, or the
/// JSON wrapper with metadata
impl Formattable for Value {
    fn format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Pretty => Ok(serde_json::to_string_pretty(self)?),
            OutputFormat::Table => Ok(table::format_value(self)),
            OutputFormat::Json => Ok(json::format_json(self)?),
        }
    }
}

/// Format and print data to stdout
pub fn print<T: Formattable + ?Sized>(data: &T, format: OutputFormat) -> Result<()> {
    let output = data.format(format)?;
    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_pretty_is_plain_json() {
        let out = json!({"total": 3}).format(OutputFormat::Pretty).unwrap();
        assert!(out.contains("\"total\": 3"));
        assert!(!out.contains("\"meta\""));
    }

    #[test]
    fn test_value_json_is_wrapped() {
        let out = json!([1, 2]).format(OutputFormat::Json).unwrap();
        assert!(out.contains("\"data\""));
        assert!(out.contains("\"meta\""));
    }

    #[test]
    fn test_value_table_renders_rows() {
        let out = json!([{"kode": "BRG-1", "stok": 4}])
            .format(OutputFormat::Table)
            .unwrap();
        assert!(out.contains("kode"));
        assert!(out.contains("BRG-1"));
    }
}
