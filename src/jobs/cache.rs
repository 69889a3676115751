// src/jobs/cache.rs
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use super::{JobPage, JobPosting};

struct CachedPage {
    page: JobPage,
    stored_at: Instant,
}

/// A cache hit, fresh or past its time-to-live
pub struct CacheHit {
    pub page: JobPage,
    pub expired: bool,
}

/// Search results and job details for one session. Expired pages stay
/// around as a fallback until evicted or cleared.
pub struct SearchCache {
    ttl: Duration,
    max_entries: usize,
    pages: HashMap<String, CachedPage>,
    insertion_order: VecDeque<String>,
    jobs: HashMap<String, JobPosting>,
}

impl SearchCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries: max_entries.max(1),
            pages: HashMap::new(),
            insertion_order: VecDeque::new(),
            jobs: HashMap::new(),
        }
    }

    pub fn lookup(&self, key: &str, now: Instant) -> Option<CacheHit> {
        self.pages.get(key).map(|cached| CacheHit {
            page: cached.page.clone(),
            expired: now.saturating_duration_since(cached.stored_at) > self.ttl,
        })
    }

    pub fn insert(&mut self, key: String, page: JobPage, now: Instant) {
        for job in &page.jobs {
            self.jobs.insert(job.id.clone(), job.clone());
        }

        if self.pages.contains_key(&key) {
            self.insertion_order.retain(|k| *k != key);
        }
        self.insertion_order.push_back(key.clone());
        self.pages.insert(key, CachedPage { page, stored_at: now });

        while self.pages.len() > self.max_entries {
            match self.insertion_order.pop_front() {
                Some(oldest) => {
                    self.pages.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub fn job(&self, id: &str) -> Option<&JobPosting> {
        self.jobs.get(id)
    }

    pub fn remember_job(&mut self, job: JobPosting) {
        self.jobs.insert(job.id.clone(), job);
    }

    /// Drop everything, returning the number of cached pages removed
    pub fn clear(&mut self) -> usize {
        let removed = self.pages.len();
        self.pages.clear();
        self.insertion_order.clear();
        self.jobs.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
