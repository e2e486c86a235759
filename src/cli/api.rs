//! Read, batch and write commands

use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use crate::cache::Params;
use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::client::endpoints::{self, ENDPOINTS, OperationKind};
use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::output::{self, table};

/// Run a read operation and print its payload
pub async fn read(
    opts: &GlobalOptions,
    operation: &str,
    params: Vec<(String, String)>,
    domain: Option<Domain>,
) -> Result<()> {
    let wire = expect_kind(operation, OperationKind::Read)?;
    let ctx = CommandContext::new(opts)?;
    let domain = ctx.resolve_domain(domain);

    let params: Params = params
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();

    let payload = ctx.gateway.read(wire, &params, domain, ctx.use_cache).await?;
    output::print(&payload, ctx.format)
}

/// Fetch the batched dashboard datasets
pub async fn batch(opts: &GlobalOptions, domain: Option<Domain>) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let domain = ctx.resolve_domain(domain);

    let payload = ctx.gateway.batch_read(domain, ctx.use_cache).await?;
    output::print(&payload, ctx.format)
}

/// Run a write operation, then record it in the audit trail
pub async fn write(
    opts: &GlobalOptions,
    operation: &str,
    data: &str,
    domain: Option<Domain>,
) -> Result<()> {
    let wire = expect_kind(operation, OperationKind::Write)?;
    let data: Value = serde_json::from_str(data)
        .map_err(|e| Error::Other(format!("--data is not valid JSON: {}", e)))?;

    let ctx = CommandContext::new(opts)?;
    let domain = ctx.resolve_domain(domain);

    let result = ctx.gateway.write(wire, &data, domain).await?;

    if let Some(handle) = ctx
        .sessions
        .log_audit(&audit_action(operation), &data.to_string())
    {
        let _ = handle.await;
    }

    match ctx.format {
        OutputFormat::Pretty if result.is_null() => {
            println!("{} {} ({})", "✓".green(), operation, domain);
            Ok(())
        }
        format => output::print(&result, format),
    }
}

#[derive(Tabled, Serialize)]
struct EndpointRow {
    #[tabled(rename = "OPERATION")]
    name: &'static str,
    #[tabled(rename = "SENT AS")]
    wire: &'static str,
    #[tabled(rename = "KIND")]
    kind: &'static str,
}

/// List the operation catalog
pub fn list_endpoints(format: OutputFormat) -> Result<()> {
    let rows: Vec<EndpointRow> = ENDPOINTS
        .iter()
        .map(|e| EndpointRow {
            name: e.name,
            wire: e.wire,
            kind: e.kind.as_str(),
        })
        .collect();

    match format {
        OutputFormat::Json => println!("{}", output::json::format_json(&rows)?),
        _ => println!("{}", table::format_table(&rows)),
    }
    Ok(())
}

/// Resolve the wire name, refusing catalogued operations of another kind.
/// Uncatalogued names pass through.
fn expect_kind(operation: &str, expected: OperationKind) -> Result<&str> {
    if let Some(endpoint) = endpoints::lookup(operation) {
        let compatible = match expected {
            OperationKind::Write => endpoint.kind == OperationKind::Write,
            _ => endpoint.kind != OperationKind::Write,
        };
        if !compatible {
            return Err(Error::Other(format!(
                "'{}' is a {} operation; use `siwaras {}`",
                operation,
                endpoint.kind.as_str(),
                if endpoint.kind == OperationKind::Write { "write" } else { "read" },
            )));
        }
    }
    Ok(endpoints::wire_name(operation))
}

/// `createMasterBarang` -> `CREATE_MASTER_BARANG`
fn audit_action(operation: &str) -> String {
    let mut action = String::with_capacity(operation.len() + 4);
    for (i, ch) in operation.chars().enumerate() {
        if ch.is_uppercase() && i > 0 {
            action.push('_');
        }
        action.push(ch.to_ascii_uppercase());
    }
    action
}
