//! Catalog of backend operations
//!
//! Front-ends refer to operations by name; some writes travel under a
//! shorter wire name (`createMasterBarang` is sent as `masterBarang`).
//! Routine audit entries go out as `auditLog` itself; only the failed-login
//! audit uses the catalog's `audit_Log`.

/// How an operation is issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Several datasets in one GET
    Batch,
    /// Cached GET
    Read,
    /// Uncached POST that invalidates its domain
    Write,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Batch => "batch",
            OperationKind::Read => "read",
            OperationKind::Write => "write",
        }
    }
}

/// A named backend operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub name: &'static str,
    pub wire: &'static str,
    pub kind: OperationKind,
}

const fn op(name: &'static str, wire: &'static str, kind: OperationKind) -> Endpoint {
    Endpoint { name, wire, kind }
}

/// Batched dashboard read (replaces three separate reads)
pub const READ_DASHBOARD_ALL: &str = "readDashboardAll";
/// Sign-in write
pub const LOGIN: &str = "login";
/// Audit trail write
pub const AUDIT_LOG: &str = "auditLog";

use OperationKind::{Batch, Read, Write};

pub const ENDPOINTS: &[Endpoint] = &[
    op(READ_DASHBOARD_ALL, READ_DASHBOARD_ALL, Batch),
    op("readDashboardStats", "readDashboardStats", Read),
    op("readMasterBarangLight", "readMasterBarangLight", Read),
    op("readAudit", "readAudit", Read),
    op("readAdmin", "readAdmin", Read),
    op("readMasterBarang", "readMasterBarang", Read),
    op("readBarangMasuk", "readBarangMasuk", Read),
    op("readBarangKeluar", "readBarangKeluar", Read),
    op("readTandaTerima", "readTandaTerima", Read),
    op("readTandaTerimaBarang", "readTandaTerimaBarang", Read),
    op("readTandaTerimaFormData", "readTandaTerimaFormData", Read),
    op(LOGIN, LOGIN, Write),
    op("createAdmin", "admin", Write),
    op("createMasterBarang", "masterBarang", Write),
    op("updateMasterBarang", "updateMasterBarang", Write),
    op("deleteMasterBarang", "deleteMasterBarang", Write),
    op("createBarangMasuk", "barangMasuk", Write),
    op("updateBarangMasuk", "updateBarangMasuk", Write),
    op("deleteBarangMasuk", "deleteBarangMasuk", Write),
    op("createBarangKeluar", "barangKeluar", Write),
    op("updateBarangKeluar", "updateBarangKeluar", Write),
    op("deleteBarangKeluar", "deleteBarangKeluar", Write),
    op("createTandaTerima", "tandaTerima", Write),
    op("updateTandaTerimaStatus", "updateTandaTerimaStatus", Write),
    op("deleteTandaTerima", "deleteTandaTerima", Write),
    op("addTandaTerimaBarang", "tandaTerimaBarang", Write),
    op("deleteTandaTerimaBarang", "deleteTandaTerimaBarang", Write),
    op("updateTandaTerimaFormData", "updateTandaTerimaFormData", Write),
    op(AUDIT_LOG, "audit_Log", Write),
];

/// Find an operation by catalog name or wire name
pub fn lookup(name: &str) -> Option<&'static Endpoint> {
    ENDPOINTS
        .iter()
        .find(|e| e.name == name)
        .or_else(|| ENDPOINTS.iter().find(|e| e.wire == name))
}

/// Wire name to send for `name`; unknown names pass through verbatim
pub fn wire_name(name: &str) -> &str {
    match lookup(name) {
        Some(endpoint) => endpoint.wire,
        None => {
            log::debug!("Operation '{}' not in catalog, sending as-is", name);
            name
        }
    }
}
