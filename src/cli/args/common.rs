//! Common CLI types shared across commands

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty format - indented JSON payloads, readable status text
    #[default]
    Pretty,
    /// Table format - one row per record
    Table,
    /// JSON format - payload wrapped with metadata, for scripts
    Json,
}

/// Parse a `key=value` query parameter. The value is kept as text.
pub fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}
