//! Command execution context
//!
//! Opens the session store, sweeps expired cache entries (once per run, the
//! way a page load does), and wires the gateway and session manager.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::CacheStore;
use crate::cli::{GlobalOptions, OutputFormat};
use crate::client::{ApiGateway, HttpTransport};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::domain::Domain;
use crate::error::Result;
use crate::session::SessionManager;
use crate::storage::SessionStorage;

/// Everything a command needs, built once per invocation
pub struct CommandContext {
    /// Config file merged with CLI/env overrides
    pub config: Config,
    pub format: OutputFormat,
    /// Whether reads may be served from and stored to the cache
    pub use_cache: bool,
    /// Expired entries removed while opening the store
    pub swept: usize,
    pub cache: Arc<CacheStore>,
    pub gateway: Arc<ApiGateway>,
    pub sessions: SessionManager,
}

impl CommandContext {
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let config = Self::effective_config(opts)?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let storage = Arc::new(match opts.store_ref() {
            Some(path) => SessionStorage::open_at(&PathBuf::from(path), config.storage_quota_bytes)?,
            None => SessionStorage::open(config.storage_quota_bytes)?,
        });

        let cache = Arc::new(CacheStore::new(
            Arc::clone(&storage),
            config.cache_ttl(),
            Arc::clone(&clock),
        ));
        let swept = cache.sweep_expired();
        if swept > 0 {
            log::debug!("Swept {} expired cache entries", swept);
        }

        let transport = Arc::new(HttpTransport::new(config.request_timeout())?);
        let gateway = Arc::new(ApiGateway::new(
            transport,
            Arc::clone(&cache),
            config.base_urls(),
            config.request_timeout(),
            Arc::clone(&clock),
        ));
        let sessions = SessionManager::new(storage, Arc::clone(&gateway), clock);

        Ok(Self {
            config,
            format: opts.format,
            use_cache: !opts.no_cache,
            swept,
            cache,
            gateway,
            sessions,
        })
    }

    /// Load the config file and apply URL overrides
    pub fn effective_config(opts: &GlobalOptions) -> Result<Config> {
        let mut config = Config::load_at(opts.config_ref())?;
        if let Some(url) = &opts.wisuda_url {
            config.wisuda_url = url.clone();
        }
        if let Some(url) = &opts.sosprom_url {
            config.sosprom_url = url.clone();
        }
        config.validate()?;
        Ok(config)
    }

    /// Session store location for these options
    pub fn store_path(opts: &GlobalOptions) -> Result<PathBuf> {
        match opts.store_ref() {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(SessionStorage::storage_dir()?.join("session.db")),
        }
    }

    /// Explicit domain, else the signed-in domain, else wisuda
    pub fn resolve_domain(&self, explicit: Option<Domain>) -> Domain {
        explicit.unwrap_or_else(|| self.sessions.get_session().domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{AdminInfo, Role};

    fn opts_in(dir: &tempfile::TempDir) -> GlobalOptions {
        GlobalOptions {
            config: Some(dir.path().join("config.yaml").display().to_string()),
            store: Some(dir.path().join("session.db").display().to_string()),
            ..GlobalOptions::default()
        }
    }

    #[test]
    fn test_url_overrides_win_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = opts_in(&dir);
        opts.sosprom_url = Some("http://127.0.0.1:9/sosprom".to_string());

        let config = CommandContext::effective_config(&opts).unwrap();
        assert_eq!(config.sosprom_url, "http://127.0.0.1:9/sosprom");
        assert_eq!(config.wisuda_url, crate::config::DEFAULT_WISUDA_URL);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = opts_in(&dir);
        opts.wisuda_url = Some("not-a-url".to_string());

        assert!(CommandContext::effective_config(&opts).is_err());
    }

    #[test]
    fn test_store_path_override() {
        let dir = tempfile::tempdir().unwrap();
        let opts = opts_in(&dir);
        assert_eq!(
            CommandContext::store_path(&opts).unwrap(),
            dir.path().join("session.db")
        );
    }

    #[test]
    fn test_resolve_domain_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = CommandContext::new(&opts_in(&dir)).unwrap();

        assert_eq!(ctx.resolve_domain(None), Domain::Wisuda);

        ctx.sessions
            .set_session("budi", Role::GuestSosprom, Domain::Sosprom, &AdminInfo::default())
            .unwrap();
        assert_eq!(ctx.resolve_domain(None), Domain::Sosprom);
        assert_eq!(ctx.resolve_domain(Some(Domain::Wisuda)), Domain::Wisuda);
    }
}
