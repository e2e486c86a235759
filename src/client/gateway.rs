//! Cached, coalesced access to the per-domain backends
//!
//! Reads check the cache, then run (or join) one network call per key and
//! store the result. Writes always hit the network, are never merged with
//! each other, and invalidate their domain's cache on success.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::coalesce::RequestCoalescer;
use super::endpoints::{LOGIN, READ_DASHBOARD_ALL};
use super::envelope::unwrap_response;
use super::{ApiRequest, Transport};
use crate::cache::key::{batch_request_key, read_request_key, write_request_key};
use crate::cache::{CacheStore, Params};
use crate::clock::Clock;
use crate::domain::Domain;
use crate::error::ApiError;

/// Request timeout applied to every call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Cache slot used for the batched dashboard payload
const DASHBOARD_CACHE_OPERATION: &str = "dashboardAll";

/// Base endpoint for each domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrls {
    pub wisuda: String,
    pub sosprom: String,
}

impl BaseUrls {
    pub fn for_domain(&self, domain: Domain) -> &str {
        match domain {
            Domain::Wisuda => &self.wisuda,
            Domain::Sosprom => &self.sosprom,
        }
    }
}

/// Everything a spawned call needs, cheap to clone into the task
#[derive(Clone)]
struct CallContext {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl CallContext {
    /// Send with the timeout applied and unwrap the envelope
    async fn call(&self, request: ApiRequest) -> Result<Value, ApiError> {
        match tokio::time::timeout(self.timeout, self.transport.send(request)).await {
            Ok(response) => unwrap_response(response?),
            Err(_) => Err(ApiError::Timeout),
        }
    }
}

/// API gateway shared by every front-end page or command
pub struct ApiGateway {
    ctx: CallContext,
    cache: Arc<CacheStore>,
    coalescer: RequestCoalescer,
    base_urls: BaseUrls,
    clock: Arc<dyn Clock>,
    write_sequence: AtomicU64,
}

impl ApiGateway {
    pub fn new(
        transport: Arc<dyn Transport>,
        cache: Arc<CacheStore>,
        base_urls: BaseUrls,
        timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ctx: CallContext { transport, timeout },
            cache,
            coalescer: RequestCoalescer::new(),
            base_urls,
            clock,
            write_sequence: AtomicU64::new(0),
        }
    }

    /// The cache this gateway populates
    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Read-style call.
    ///
    /// Served from cache when `use_cache` is set and an entry is valid;
    /// otherwise one network call per key runs and its result is cached.
    pub async fn read(
        &self,
        operation: &str,
        params: &Params,
        domain: Domain,
        use_cache: bool,
    ) -> Result<Value, ApiError> {
        if use_cache && let Some(cached) = self.cache.get(operation, params, domain) {
            return Ok(cached);
        }

        let key = read_request_key(operation, domain, params);
        let request = self.get_request(operation, params, domain);
        self.fetch(&key, request, operation, params, domain, use_cache)
            .await
    }

    /// Typed read, deserializing the payload with serde
    #[allow(dead_code)]
    pub async fn read_as<T: DeserializeOwned>(
        &self,
        operation: &str,
        params: &Params,
        domain: Domain,
        use_cache: bool,
    ) -> Result<T, ApiError> {
        let value = self.read(operation, params, domain, use_cache).await?;
        serde_json::from_value(value).map_err(|e| {
            ApiError::InvalidResponse(format!("Unexpected payload for {}: {}", operation, e))
        })
    }

    /// Batched dashboard read: several datasets in one call, keyed by domain
    pub async fn batch_read(&self, domain: Domain, use_cache: bool) -> Result<Value, ApiError> {
        let params = Params::new();
        if use_cache
            && let Some(cached) = self.cache.get(DASHBOARD_CACHE_OPERATION, &params, domain)
        {
            return Ok(cached);
        }

        let key = batch_request_key(domain);
        let request = self.get_request(READ_DASHBOARD_ALL, &params, domain);
        log::debug!("API batch: dashboard all ({})", domain);
        self.fetch(
            &key,
            request,
            DASHBOARD_CACHE_OPERATION,
            &params,
            domain,
            use_cache,
        )
        .await
    }

    /// Write-style call. Never cached, never merged with another write.
    /// On success the whole domain's cache is invalidated.
    pub async fn write(
        &self,
        operation: &str,
        data: &Value,
        domain: Domain,
    ) -> Result<Value, ApiError> {
        let sequence = self.write_sequence.fetch_add(1, Ordering::Relaxed);
        let key = write_request_key(operation, domain, self.clock.now_millis(), sequence);

        let request = ApiRequest::Post {
            url: self.base_urls.for_domain(domain).to_string(),
            body: json!({ "type": operation, "data": data }).to_string(),
        };

        log::debug!("API POST: {} ({})", operation, domain);
        let ctx = self.ctx.clone();
        let cache = Arc::clone(&self.cache);

        // Invalidation runs on the call's task so it happens even if the
        // caller stops waiting.
        self.coalescer
            .execute(&key, move || async move {
                let result = ctx.call(request).await?;
                cache.invalidate(Some(domain));
                Ok(result)
            })
            .await
    }

    /// Credential check, a plain write of `{username, password}`
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        domain: Domain,
    ) -> Result<Value, ApiError> {
        log::debug!("Login attempt: {} ({})", username, domain);
        self.write(
            LOGIN,
            &json!({ "username": username, "password": password }),
            domain,
        )
        .await
    }

    /// Run (or join) the network call for a read and cache its result
    async fn fetch(
        &self,
        key: &str,
        request: ApiRequest,
        operation: &str,
        params: &Params,
        domain: Domain,
        use_cache: bool,
    ) -> Result<Value, ApiError> {
        let ctx = self.ctx.clone();
        let cache = Arc::clone(&self.cache);
        let operation = operation.to_string();
        let params = params.clone();

        self.coalescer
            .execute(key, move || async move {
                log::debug!("API GET: {} ({})", operation, domain);
                let result = ctx.call(request).await?;
                if use_cache {
                    cache.set(&operation, &params, domain, &result);
                }
                Ok(result)
            })
            .await
    }

    /// Compose `{base}?type=...&<params>&_t=<millis>`
    fn get_request(&self, operation: &str, params: &Params, domain: Domain) -> ApiRequest {
        let mut query = Vec::with_capacity(params.len() + 2);
        query.push(("type".to_string(), operation.to_string()));
        for (name, value) in params {
            query.push((name.clone(), query_value(value)));
        }
        query.push(("_t".to_string(), self.clock.now_millis().to_string()));

        ApiRequest::Get {
            url: self.base_urls.for_domain(domain).to_string(),
            query,
        }
    }
}

/// Render a parameter as a query string value
fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
