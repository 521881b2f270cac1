//! Mock implementations for testing
//!
//! These mocks enable testing the store and router without real I/O.

use super::traits::*;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// Mock Persistence Backend
// ============================================================================

/// In-memory backend with injectable latency and failures
pub struct MemoryBackend {
    data: Mutex<HashMap<String, Vec<u8>>>,
    latency: Option<Duration>,
    write_latency: Option<Duration>,
    fail_writes: AtomicBool,
    failing_reads: AtomicU32,
    flushes: AtomicU32,
    writes: AtomicU32,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
            latency: None,
            write_latency: None,
            fail_writes: AtomicBool::new(false),
            failing_reads: AtomicU32::new(0),
            flushes: AtomicU32::new(0),
            writes: AtomicU32::new(0),
        }
    }

    /// Delay every call, widening the window between read and write
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Extra delay on writes only
    pub fn with_write_latency(mut self, latency: Duration) -> Self {
        self.write_latency = Some(latency);
        self
    }

    /// Make every write fail until turned off
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Fail the next `n` reads
    pub fn fail_next_reads(&self, n: u32) {
        self.failing_reads.store(n, Ordering::SeqCst);
    }

    pub fn put_raw(&self, user_id: &str, bytes: &[u8]) {
        self.data
            .lock()
            .unwrap()
            .insert(user_id.to_string(), bytes.to_vec());
    }

    pub fn raw(&self, user_id: &str) -> Option<Vec<u8>> {
        self.data.lock().unwrap().get(user_id).cloned()
    }

    pub fn flush_count(&self) -> u32 {
        self.flushes.load(Ordering::SeqCst)
    }

    /// Number of writes that landed
    pub fn write_count(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistenceBackend for MemoryBackend {
    async fn read(&self, user_id: &str) -> Result<Option<Vec<u8>>, BackendError> {
        self.delay().await;
        let failing = self
            .failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(BackendError::Unavailable("injected read failure".to_string()));
        }
        Ok(self.raw(user_id))
    }

    async fn write(&self, user_id: &str, bytes: &[u8]) -> Result<(), BackendError> {
        self.delay().await;
        if let Some(latency) = self.write_latency {
            tokio::time::sleep(latency).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("injected write failure".to_string()));
        }
        self.put_raw(user_id, bytes);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn flush(&self) -> Result<(), BackendError> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Mock Clock
// ============================================================================

/// Clock frozen at a settable instant
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn at(date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            now: Mutex::new(date.and_time(time)),
        }
    }

    /// Noon on the given day
    pub fn on(date: NaiveDate) -> Self {
        Self::at(date, NaiveTime::from_hms_opt(12, 0, 0).unwrap())
    }

    pub fn advance_days(&self, days: i64) {
        let mut now = self.now.lock().unwrap();
        *now += ChronoDuration::days(days);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }
}

// ============================================================================
// Mock Random Source
// ============================================================================

/// Returns queued indices in order, then falls back to 0
pub struct ScriptedRandom {
    picks: Mutex<VecDeque<usize>>,
    /// Lengths passed to `pick`
    pub requested: Mutex<Vec<usize>>,
}

impl ScriptedRandom {
    pub fn new(picks: impl IntoIterator<Item = usize>) -> Self {
        Self {
            picks: Mutex::new(picks.into_iter().collect()),
            requested: Mutex::new(Vec::new()),
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn pick(&self, len: usize) -> usize {
        self.requested.lock().unwrap().push(len);
        self.picks.lock().unwrap().pop_front().unwrap_or(0) % len
    }
}
