// src/core/sessions.rs
//! Per-session state keyed by client-chosen ids. Idle sessions are swept
//! and the session count is capped, least recently used first.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::app_log;

pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(3600);
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

struct Entry<T> {
    value: T,
    last_access: Instant,
}

pub struct SessionStore<T> {
    idle_timeout: Duration,
    max_sessions: usize,
    entries: HashMap<String, Entry<T>>,
}

impl<T> Default for SessionStore<T> {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_IDLE, DEFAULT_MAX_SESSIONS)
    }
}

impl<T> SessionStore<T> {
    pub fn new(idle_timeout: Duration, max_sessions: usize) -> Self {
        Self {
            idle_timeout,
            max_sessions: max_sessions.max(1),
            entries: HashMap::new(),
        }
    }

    /// State of an existing session, marking it as used
    pub fn get_mut(&mut self, session: &str, now: Instant) -> Option<&mut T> {
        self.entries.get_mut(session).map(|entry| {
            entry.last_access = now;
            &mut entry.value
        })
    }

    /// State of a session, created with `init` when absent. Creating a
    /// session first sweeps idle ones and makes room under the cap.
    pub fn get_or_insert_with(
        &mut self,
        session: &str,
        now: Instant,
        init: impl FnOnce() -> T,
    ) -> &mut T {
        if !self.entries.contains_key(session) {
            self.sweep(now);
            while self.entries.len() >= self.max_sessions {
                if !self.evict_least_recent() {
                    break;
                }
            }
        }

        let entry = self
            .entries
            .entry(session.to_string())
            .or_insert_with(|| Entry {
                value: init(),
                last_access: now,
            });
        entry.last_access = now;
        &mut entry.value
    }

    pub fn remove(&mut self, session: &str) -> Option<T> {
        self.entries.remove(session).map(|entry| entry.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sweep(&mut self, now: Instant) {
        let before = self.entries.len();
        let idle_timeout = self.idle_timeout;
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.last_access) <= idle_timeout);
        let swept = before - self.entries.len();
        if swept > 0 {
            app_log!(trace, "Swept {} idle sessions", swept);
        }
    }

    fn evict_least_recent(&mut self) -> bool {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(key, _)| key.clone());
        match oldest {
            Some(key) => {
                self.entries.remove(&key);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_sessions_are_swept_on_insert() {
        let mut store = SessionStore::new(Duration::from_secs(60), 100);
        let start = Instant::now();
        for i in 0..50 {
            *store.get_or_insert_with(&format!("s{}", i), start, || 0) += 1;
        }
        assert_eq!(store.len(), 50);

        store.get_or_insert_with("late", start + Duration::from_secs(61), || 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_cap_evicts_least_recently_used() {
        let mut store = SessionStore::new(Duration::from_secs(3600), 2);
        let start = Instant::now();
        store.get_or_insert_with("a", start, || 1);
        store.get_or_insert_with("b", start + Duration::from_secs(1), || 2);
        assert_eq!(store.get_mut("a", start + Duration::from_secs(2)), Some(&mut 1));

        store.get_or_insert_with("c", start + Duration::from_secs(3), || 3);
        assert_eq!(store.len(), 2);
        assert!(store.get_mut("b", start).is_none());
        assert!(store.get_mut("a", start).is_some());
        assert!(store.get_mut("c", start).is_some());
    }

    #[test]
    fn test_existing_session_is_kept_and_touched() {
        let mut store = SessionStore::new(Duration::from_secs(10), 10);
        let start = Instant::now();
        store.get_or_insert_with("a", start, || 1);
        *store.get_or_insert_with("a", start + Duration::from_secs(8), || 99) += 1;
        store.get_or_insert_with("b", start + Duration::from_secs(15), || 0);

        assert_eq!(store.remove("a"), Some(2));
        assert!(store.remove("a").is_none());
    }
}
