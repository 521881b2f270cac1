//! Record store
//!
//! Owns every persisted `FitnessRecord`. All reads and writes go through
//! `get` and `update`; `update` is a read-modify-write performed under a
//! per-user lock so concurrent increments for one user are never lost, while
//! different users proceed in parallel.

use crate::record::FitnessRecord;
use crate::runtime::{BackendError, PersistenceBackend};
use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OwnedMutexGuard;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage unavailable for {user_id} after {attempts} attempt(s): {source}")]
    StorageUnavailable {
        user_id: String,
        attempts: u32,
        #[source]
        source: BackendError,
    },
    #[error("Stored record for {user_id} is corrupt: {source}")]
    CorruptRecord {
        user_id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode record for {user_id}: {source}")]
    Encode {
        user_id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Whether retrying the same request later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::StorageUnavailable { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Bounds on how long a single backend call may keep a user locked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(100),
            call_timeout: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff: base, 2*base, 4*base, ...
    fn delay(&self, attempt: u32) -> Duration {
        self.base_backoff
            .saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
    }
}

/// What happens to a backend call once its timeout fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnTimeout {
    /// Drop it; reads and flushes leave nothing behind
    Abandon,
    /// Wait for it to finish before anything else touches the user's record,
    /// so a late write can never land on top of a newer one
    Settle,
}

type UserLocks = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// Exclusive access to one user's record.
///
/// Dropping the lease releases the lock and forgets the user's entry when
/// nobody else holds or waits on it, so the map only tracks active users.
struct UserLease<'a> {
    locks: &'a UserLocks,
    user_id: String,
    lock: Option<Arc<tokio::sync::Mutex<()>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for UserLease<'_> {
    fn drop(&mut self) {
        // The guard holds its own clone of the mutex; release it first.
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(lock) = self.lock.take() {
            // Clones are only made under the map lock: map + ours means no waiter.
            if Arc::strong_count(&lock) == 2 {
                locks.remove(&self.user_id);
            }
            drop(lock);
        }
    }
}

/// Per-user serialized access to fitness records
pub struct RecordStore {
    backend: Arc<dyn PersistenceBackend>,
    policy: RetryPolicy,
    locks: UserLocks,
}

impl RecordStore {
    pub fn new(backend: Arc<dyn PersistenceBackend>, policy: RetryPolicy) -> Self {
        Self {
            backend,
            policy,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lease(&self, user_id: &str) -> UserLease<'_> {
        let lock = {
            // Only held for the lookup, so a poisoned map is still usable.
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(user_id.to_string()).or_default().clone()
        };
        let mut lease = UserLease {
            locks: &self.locks,
            user_id: user_id.to_string(),
            lock: Some(lock.clone()),
            guard: None,
        };
        lease.guard = Some(lock.lock_owned().await);
        lease
    }

    /// Load the user's record, creating and persisting the default on first access
    pub async fn get(&self, user_id: &str) -> StoreResult<FitnessRecord> {
        let _lease = self.lease(user_id).await;
        self.load_or_create(user_id).await
    }

    /// Apply `mutate` to the current record and persist the result.
    ///
    /// The closure runs while the user's lock is held; it must be pure and
    /// must not block. If persisting fails, nothing is committed and the
    /// error is returned.
    pub async fn update<F, R>(&self, user_id: &str, mutate: F) -> StoreResult<(FitnessRecord, R)>
    where
        F: FnOnce(&mut FitnessRecord) -> R,
    {
        match self
            .try_update(user_id, |record| Ok::<R, Infallible>(mutate(record)))
            .await?
        {
            Ok(updated) => Ok(updated),
            Err(never) => match never {},
        }
    }

    /// Like [`update`](Self::update), but `mutate` may refuse the change.
    ///
    /// A refusal is returned as the inner `Err` and nothing is written.
    pub async fn try_update<F, R, E>(
        &self,
        user_id: &str,
        mutate: F,
    ) -> StoreResult<Result<(FitnessRecord, R), E>>
    where
        F: FnOnce(&mut FitnessRecord) -> Result<R, E>,
    {
        let _lease = self.lease(user_id).await;

        let mut record = self.load_or_create(user_id).await?;
        let output = match mutate(&mut record) {
            Ok(output) => output,
            Err(refused) => return Ok(Err(refused)),
        };
        self.persist(user_id, &record).await?;
        Ok(Ok((record, output)))
    }

    /// Flush the backend. Called once on shutdown.
    pub async fn close(&self) -> StoreResult<()> {
        tracing::info!("Flushing record store");
        self.with_retry("*", OnTimeout::Abandon, || self.backend.flush())
            .await
    }

    async fn load_or_create(&self, user_id: &str) -> StoreResult<FitnessRecord> {
        let existing = self
            .with_retry(user_id, OnTimeout::Abandon, || self.backend.read(user_id))
            .await?;
        match existing {
            Some(bytes) => FitnessRecord::from_bytes(&bytes).map_err(|source| {
                tracing::error!(user_id = %user_id, error = %source, "Stored record failed to decode");
                StoreError::CorruptRecord {
                    user_id: user_id.to_string(),
                    source,
                }
            }),
            None => {
                let record = FitnessRecord::default();
                self.persist(user_id, &record).await?;
                tracing::info!(user_id = %user_id, "Created fitness record");
                Ok(record)
            }
        }
    }

    async fn persist(&self, user_id: &str, record: &FitnessRecord) -> StoreResult<()> {
        let bytes = record.to_bytes().map_err(|source| StoreError::Encode {
            user_id: user_id.to_string(),
            source,
        })?;
        self.with_retry(user_id, OnTimeout::Settle, || self.backend.write(user_id, &bytes))
            .await
    }

    /// Run a backend call with a per-call timeout and bounded retries
    async fn with_retry<T, F, Fut>(&self, user_id: &str, on_timeout: OnTimeout, mut call: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let mut pending = Box::pin(call());
            let result = match tokio::time::timeout(self.policy.call_timeout, &mut pending).await {
                Ok(r) => r,
                Err(_) if on_timeout == OnTimeout::Settle => {
                    tracing::warn!(user_id = %user_id, attempt, "Storage write timed out, waiting for it to settle");
                    match pending.await {
                        Ok(value) => return Ok(value),
                        Err(e) => {
                            tracing::debug!(user_id = %user_id, error = %e, "Timed-out write failed");
                            Err(BackendError::TimedOut)
                        }
                    }
                }
                Err(_) => Err(BackendError::TimedOut),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if attempt < max_attempts => {
                    let delay = self.policy.delay(attempt);
                    tracing::warn!(
                        user_id = %user_id,
                        attempt,
                        delay_ms = %delay.as_millis(),
                        error = %e,
                        "Storage call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(user_id = %user_id, attempts = attempt, error = %e, "Storage unavailable");
                    return Err(StoreError::StorageUnavailable {
                        user_id: user_id.to_string(),
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
    }
}
