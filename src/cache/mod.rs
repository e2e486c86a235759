//! Response cache for API reads
//!
//! Payloads are persisted in session storage under
//! `siwaras_cache_{operation}_{domain}_{params}` and expire after one shared
//! TTL. Writes invalidate the whole domain they touched.

pub mod key;
pub mod store;

use std::time::Duration;

/// TTL shared by every cached read
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60); // 5 min

// Re-export main types
pub use key::Params;
pub use store::CacheStore;
