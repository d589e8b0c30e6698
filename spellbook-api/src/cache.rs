//! Display-URL cache
//!
//! Signed read URLs are cached per note so listing a class does not re-sign
//! every page on each request. Entries live for a fixed TTL that callers
//! keep below the lifetime of the URL itself, and a class is invalidated
//! explicitly whenever its notes change.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

pub struct TtlCache<V: Clone> {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the value if it has not expired; expired entries are evicted
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().unwrap();
        let now = Instant::now();

        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.lock().unwrap().insert(key.into(), entry);
    }

    /// Drops every entry whose key starts with `prefix`, returning how many
    pub fn invalidate(&self, prefix: &str) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    /// Number of entries held, including ones not yet evicted
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
