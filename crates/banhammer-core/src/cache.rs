//! Bounded in-memory cache of user profiles with least-recently-used
//! eviction.
//!
//! Profiles are never refreshed or expired: once cached, a profile is
//! considered valid until it is evicted under capacity pressure.

use std::{
  collections::{BTreeMap, HashMap},
  sync::{Arc, Mutex, MutexGuard},
};

use crate::profile::UserProfile;

/// Default number of cached profiles.
pub const DEFAULT_CAPACITY: usize = 1000;

struct Entry {
  profile: Arc<UserProfile>,
  /// Recency stamp; the key of this entry in `Inner::recency`.
  stamp:   u64,
}

#[derive(Default)]
struct Inner {
  entries: HashMap<i64, Entry>,
  /// Stamp to user id, oldest first.
  recency: BTreeMap<u64, i64>,
  clock:   u64,
}

impl Inner {
  fn tick(&mut self) -> u64 {
    self.clock += 1;
    self.clock
  }
}

/// Thread-safe LRU map from user id to profile.
///
/// The lock is only held for the duration of a single `get` or `put`, never
/// across a remote call.
pub struct UserCache {
  capacity: usize,
  inner:    Mutex<Inner>,
}

impl UserCache {
  /// Create a cache holding at most `capacity` profiles (at least one).
  pub fn new(capacity: usize) -> Self {
    Self {
      capacity: capacity.max(1),
      inner:    Mutex::new(Inner::default()),
    }
  }

  pub fn capacity(&self) -> usize { self.capacity }

  pub fn len(&self) -> usize { self.lock().entries.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  /// Look up a profile, marking it as most recently used.
  pub fn get(&self, user_id: i64) -> Option<Arc<UserProfile>> {
    let mut inner = self.lock();
    let stamp = inner.tick();
    let entry = inner.entries.get_mut(&user_id)?;
    let previous = std::mem::replace(&mut entry.stamp, stamp);
    let profile = Arc::clone(&entry.profile);
    inner.recency.remove(&previous);
    inner.recency.insert(stamp, user_id);
    Some(profile)
  }

  /// Insert or replace a profile, evicting the least recently used entry if
  /// the cache is full.
  pub fn put(&self, user_id: i64, profile: Arc<UserProfile>) {
    let mut inner = self.lock();
    let stamp = inner.tick();

    if let Some(old) = inner.entries.insert(user_id, Entry { profile, stamp }) {
      inner.recency.remove(&old.stamp);
    } else if inner.entries.len() > self.capacity
      && let Some((_, evicted)) = inner.recency.pop_first()
    {
      inner.entries.remove(&evicted);
      tracing::trace!(user_id = evicted, "evicted user from cache");
    }
    inner.recency.insert(stamp, user_id);
  }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    // Every update leaves the maps consistent, so poisoning is ignored.
    self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

impl Default for UserCache {
  fn default() -> Self { Self::new(DEFAULT_CAPACITY) }
}
