//! Per-key request serialisation.
//!
//! Two requests for the same (country, region, year) would otherwise both see
//! "year not cached" and both hit the rate-limited upstream. Holding the key's
//! guard across resolve-fetch-reconcile makes the second request observe the
//! first one's year marker instead.

use std::{
  collections::HashMap,
  hash::Hash,
  sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A map of async locks, one per in-flight key.
pub struct Flights<K> {
  inner: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K> Default for Flights<K> {
  fn default() -> Self { Self { inner: Mutex::new(HashMap::new()) } }
}

impl<K: Eq + Hash + Clone> Flights<K> {
  /// Wait until no other request holds `key`, then hold it until the guard
  /// is dropped.
  pub async fn acquire(&self, key: K) -> OwnedMutexGuard<()> {
    let lock = {
      let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
      // Entries nobody holds or waits on are dropped here.
      map.retain(|_, l| Arc::strong_count(l) > 1);
      map.entry(key).or_default().clone()
    };
    lock.lock_owned().await
  }

  /// Number of keys currently held or awaited.
  pub fn in_flight(&self) -> usize {
    self
      .inner
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .values()
      .filter(|l| Arc::strong_count(l) > 1)
      .count()
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;

  #[tokio::test]
  async fn same_key_is_serialised() {
    let flights = Arc::new(Flights::<&'static str>::default());
    let guard = flights.acquire("deu-2023").await;
    assert_eq!(flights.in_flight(), 1);

    let f = flights.clone();
    let waiter = tokio::spawn(async move {
      let _g = f.acquire("deu-2023").await;
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!waiter.is_finished());

    drop(guard);
    waiter.await.unwrap();
    assert_eq!(flights.in_flight(), 0);
  }

  #[tokio::test]
  async fn distinct_keys_do_not_block() {
    let flights = Flights::default();
    let _a = flights.acquire(("deu", 2023)).await;
    let _b = flights.acquire(("aut", 2023)).await;
    assert_eq!(flights.in_flight(), 2);
  }
}
