use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::warn;

use crate::errors::LedgerError;
use crate::models::asset::AssetId;
use crate::models::portfolio::PortfolioId;
use crate::models::user::UserId;

/// Idle entries are dropped once the table grows past this size.
const PRUNE_THRESHOLD: usize = 1_024;

/// A resource a mutating operation must own exclusively.
///
/// The derived ordering (wallets before holdings, then by id) is the global
/// acquisition order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockKey {
    Wallet(UserId),
    Holding(PortfolioId, AssetId),
}

impl std::fmt::Display for LockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockKey::Wallet(user) => write!(f, "wallet of {user}"),
            LockKey::Holding(portfolio, asset) => write!(f, "holding {asset} in {portfolio}"),
        }
    }
}

/// Guards returned by `LockTable::acquire`; everything is released on drop.
#[must_use]
pub struct LockSet {
    keys: Vec<LockKey>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl LockSet {
    pub fn keys(&self) -> &[LockKey] {
        &self.keys
    }
}

impl std::fmt::Debug for LockSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockSet").field("keys", &self.keys).finish()
    }
}

/// Per-wallet and per-holding mutual exclusion.
///
/// Keys are always taken in sorted order, so two operations can never wait
/// on each other in a cycle. Waiting is bounded: a caller that cannot get
/// every key before the timeout gets `ConcurrencyConflict` and holds nothing.
pub struct LockTable {
    locks: Mutex<HashMap<LockKey, Arc<AsyncMutex<()>>>>,
    timeout: Duration,
}

impl LockTable {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Acquire every key in `keys` (duplicates are ignored).
    pub async fn acquire(&self, mut keys: Vec<LockKey>) -> Result<LockSet, LedgerError> {
        keys.sort();
        keys.dedup();

        let deadline = tokio::time::Instant::now() + self.timeout;
        let mut guards = Vec::with_capacity(keys.len());

        for key in &keys {
            let mutex = self.entry(key);
            match tokio::time::timeout_at(deadline, mutex.lock_owned()).await {
                Ok(guard) => guards.push(guard),
                Err(_) => {
                    warn!(key = %key, timeout_ms = self.timeout.as_millis() as u64, "lock wait timed out");
                    return Err(LedgerError::ConcurrencyConflict(format!(
                        "timed out waiting for {key}"
                    )));
                }
            }
        }

        Ok(LockSet {
            keys,
            _guards: guards,
        })
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, key: &LockKey) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks.len() > PRUNE_THRESHOLD {
            // Only the table itself references an idle entry.
            locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
        }
        locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

impl std::fmt::Debug for LockTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockTable")
            .field("keys", &self.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}
