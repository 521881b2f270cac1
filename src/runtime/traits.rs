//! Trait abstractions for runtime I/O
//!
//! The core never touches the persistence medium, the wall clock or the RNG
//! directly. Each is injected so tests can substitute deterministic mocks.

use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveDateTime};
use rand::Rng;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a persistence backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Storage medium unavailable: {0}")]
    Unavailable(String),
    #[error("Storage call timed out")]
    TimedOut,
}

/// Storage medium for serialized fitness records.
///
/// Each `write` must replace the stored bytes for that user atomically: a
/// concurrent `read` sees either the old or the new payload, never a mix.
#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Read the stored payload, or `None` if the user has no record yet
    async fn read(&self, user_id: &str) -> Result<Option<Vec<u8>>, BackendError>;

    /// Replace the stored payload for the user
    async fn write(&self, user_id: &str, bytes: &[u8]) -> Result<(), BackendError>;

    /// Make all completed writes durable (called on shutdown)
    async fn flush(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Source of "now", injected so streak logic can be tested across days
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Uniform random selection, injected for deterministic challenge draws
pub trait RandomSource: Send + Sync {
    /// Pick an index in `0..len`. Only called with `len > 0`.
    fn pick(&self, len: usize) -> usize;
}

/// Choose one element of `items` using `rng`
pub fn choose<'a, T>(rng: &dyn RandomSource, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.pick(items.len()))
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: PersistenceBackend + ?Sized> PersistenceBackend for Arc<T> {
    async fn read(&self, user_id: &str) -> Result<Option<Vec<u8>>, BackendError> {
        (**self).read(user_id).await
    }

    async fn write(&self, user_id: &str, bytes: &[u8]) -> Result<(), BackendError> {
        (**self).write(user_id, bytes).await
    }

    async fn flush(&self) -> Result<(), BackendError> {
        (**self).flush().await
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

impl<T: RandomSource + ?Sized> RandomSource for Arc<T> {
    fn pick(&self, len: usize) -> usize {
        (**self).pick(len)
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Wall clock in the server's local timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Thread-local RNG from `rand`
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}
