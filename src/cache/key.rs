//! Cache and request key generation
//!
//! Keys are plain strings rather than hashes: domain-scoped invalidation has
//! to recognize which domain an entry belongs to by looking at its key.

use serde_json::{Map, Value};

use crate::domain::Domain;

/// Request parameters. Key order is insertion order, and it is part of the key.
pub type Params = Map<String, Value>;

/// Namespace prefix for every persisted cache entry
pub const CACHE_PREFIX: &str = "siwaras_cache_";

/// Serialize parameters into their canonical key form
pub fn canonical_params(params: &Params) -> String {
    // Serializing a map of JSON values cannot fail
    serde_json::to_string(params).unwrap_or_else(|_| "{}".to_string())
}

/// Persisted cache key: `{prefix}{operation}_{domain}_{params}`
pub fn cache_key(operation: &str, params: &Params, domain: Domain) -> String {
    format!(
        "{}{}_{}_{}",
        CACHE_PREFIX,
        operation,
        domain,
        canonical_params(params)
    )
}

/// Coalescing key for a read
pub fn read_request_key(operation: &str, domain: Domain, params: &Params) -> String {
    format!("GET_{}_{}_{}", operation, domain, canonical_params(params))
}

/// Coalescing key for the batched dashboard read, keyed by domain only
pub fn batch_request_key(domain: Domain) -> String {
    format!("BATCH_DASHBOARD_{}", domain)
}

/// Coalescing key for a write; unique per call so writes never merge
pub fn write_request_key(operation: &str, domain: Domain, millis: i64, sequence: u64) -> String {
    format!("POST_{}_{}_{}-{}", operation, domain, millis, sequence)
}

/// Extract the domain tag from a persisted cache key.
///
/// Operation names and parameter values may both contain `_{`, so each
/// occurrence is tried in turn. The split is accepted where the segment
/// before it is a domain tag and everything after it is a complete
/// parameter object.
pub fn domain_of(key: &str) -> Option<&str> {
    let rest = key.strip_prefix(CACHE_PREFIX)?;
    rest.match_indices("_{").find_map(|(pos, _)| {
        let tag = rest[..pos].rsplit('_').next()?;
        let params_ok = serde_json::from_str::<Params>(&rest[pos + 1..]).is_ok();
        (params_ok && tag.parse::<Domain>().is_ok()).then_some(tag)
    })
}
