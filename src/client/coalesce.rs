//! In-flight request de-duplication
//!
//! At most one call per key is outstanding. Callers arriving while a call is
//! pending join it and receive the same settlement, value or error. The
//! pending entry is dropped as soon as the call settles, so a failure never
//! sticks to later calls with the same key.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;

use crate::error::ApiError;

type Settlement = Result<Value, ApiError>;
type PendingCall = Shared<BoxFuture<'static, Settlement>>;
type PendingMap = Arc<Mutex<HashMap<String, PendingCall>>>;

/// Shares one in-flight call among every caller using the same key
#[derive(Clone, Default)]
pub struct RequestCoalescer {
    pending: PendingMap,
}

/// Removes the pending entry when the call settles, including by panic
struct PendingGuard {
    pending: PendingMap,
    key: String,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        lock(&self.pending).remove(&self.key);
    }
}

fn lock(pending: &PendingMap) -> MutexGuard<'_, HashMap<String, PendingCall>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RequestCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `operation` under `key`, or join the call already pending for it.
    ///
    /// `operation` is only invoked when no call is pending. The call runs on
    /// its own task, so it keeps going even if every caller stops waiting.
    pub async fn execute<F, Fut>(&self, key: &str, operation: F) -> Settlement
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Settlement> + Send + 'static,
    {
        let call = {
            let mut pending = lock(&self.pending);
            match pending.get(key) {
                Some(call) => {
                    log::debug!("Request joined: {}", key);
                    call.clone()
                }
                None => {
                    let call = self.spawn(key, operation());
                    pending.insert(key.to_string(), call.clone());
                    call
                }
            }
        };

        call.await
    }

    /// Number of calls currently in flight
    #[allow(dead_code)]
    pub fn in_flight(&self) -> usize {
        lock(&self.pending).len()
    }

    fn spawn<Fut>(&self, key: &str, operation: Fut) -> PendingCall
    where
        Fut: Future<Output = Settlement> + Send + 'static,
    {
        let guard = PendingGuard {
            pending: Arc::clone(&self.pending),
            key: key.to_string(),
        };

        // The guard's lock waits for the caller's insert to finish, so the
        // entry is never removed before it is added.
        let handle = tokio::spawn(async move {
            let _guard = guard;
            operation.await
        });

        async move {
            handle
                .await
                .unwrap_or_else(|e| Err(ApiError::Network(format!("Request task failed: {}", e))))
        }
        .boxed()
        .shared()
    }
}
