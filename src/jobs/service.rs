// src/jobs/service.rs
use anyhow::{anyhow, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::cache::SearchCache;
use super::html::html_to_text;
use super::{JobFilters, JobPage, JobPosting, JobSource};
use crate::app_log;
use crate::core::SessionStore;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);
pub const DEFAULT_CACHE_ENTRIES: usize = 50;

pub struct JobSearchService {
    source: Arc<dyn JobSource>,
    timeout: Duration,
    cache_ttl: Duration,
    cache_entries: usize,
    sessions: Mutex<SessionStore<SearchCache>>,
}

impl JobSearchService {
    pub fn new(source: Arc<dyn JobSource>, timeout: Duration) -> Self {
        Self {
            source,
            timeout,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_entries: DEFAULT_CACHE_ENTRIES,
            sessions: Mutex::new(SessionStore::default()),
        }
    }

    pub fn with_cache(mut self, ttl: Duration, max_entries: usize) -> Self {
        self.cache_ttl = ttl;
        self.cache_entries = max_entries;
        self
    }

    /// Bound how many session caches are held and how long an idle one lives
    pub fn with_session_limits(mut self, idle: Duration, max_sessions: usize) -> Self {
        self.sessions = Mutex::new(SessionStore::new(idle, max_sessions));
        self
    }

    pub fn session_count(&self) -> usize {
        self.caches().len()
    }

    fn caches(&self) -> MutexGuard<'_, SessionStore<SearchCache>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn with_session<T>(&self, session: &str, f: impl FnOnce(&mut SearchCache) -> T) -> T {
        let (ttl, entries) = (self.cache_ttl, self.cache_entries);
        let mut caches = self.caches();
        let cache = caches.get_or_insert_with(session, Instant::now(), || {
            SearchCache::new(ttl, entries)
        });
        f(cache)
    }

    /// Search with the session cache in front of the aggregator. A failing
    /// aggregator falls back to an expired cached page when one exists.
    pub async fn search(&self, session: &str, filters: &JobFilters) -> Result<JobPage> {
        let effective = filters.effective();
        let key = effective.cache_key();

        let cached = self.with_session(session, |cache| cache.lookup(&key, Instant::now()));
        if let Some(hit) = &cached {
            if !hit.expired {
                app_log!(trace, "Search cache hit for session {}", session);
                let mut page = hit.page.clone();
                page.from_cache = true;
                return Ok(page);
            }
        }

        match self.fetch_page(&effective).await {
            Ok(page) => {
                self.with_session(session, |cache| {
                    cache.insert(key, page.clone(), Instant::now())
                });
                Ok(page)
            }
            Err(e) => match cached {
                Some(hit) => {
                    app_log!(warn, "Job search failed, serving stale page: {:#}", e);
                    let mut page = hit.page;
                    page.from_cache = true;
                    page.stale = true;
                    Ok(page)
                }
                None => Err(e),
            },
        }
    }

    async fn fetch_page(&self, filters: &JobFilters) -> Result<JobPage> {
        let result = tokio::time::timeout(self.timeout, self.source.search(filters))
            .await
            .map_err(|_| {
                anyhow!(
                    "Job search timed out after {} seconds",
                    self.timeout.as_secs_f64()
                )
            })??;

        let received = result.jobs.len();
        let jobs: Vec<JobPosting> = result
            .jobs
            .into_iter()
            .map(clean_posting)
            .filter(|job| filters.matches(job))
            .collect();

        if jobs.len() < received {
            app_log!(
                trace,
                "Post-filter dropped {} of {} jobs",
                received - jobs.len(),
                received
            );
        }

        Ok(JobPage::new(jobs, result.total, filters.page, filters.per_page))
    }

    /// Job detail, from results already seen in this session when possible
    pub async fn get_job(&self, session: &str, id: &str) -> Result<Option<JobPosting>> {
        if let Some(job) = self.with_session(session, |cache| cache.job(id).cloned()) {
            return Ok(Some(job));
        }

        let fetched = tokio::time::timeout(self.timeout, self.source.fetch_job(id))
            .await
            .map_err(|_| anyhow!("Fetching job {} timed out", id))??;

        Ok(fetched.map(|job| {
            let job = clean_posting(job);
            self.with_session(session, |cache| cache.remember_job(job.clone()));
            job
        }))
    }

    /// Forget every cached page and job of the session
    pub fn clear_cache(&self, session: &str) -> usize {
        let removed = self
            .caches()
            .remove(session)
            .map(|mut cache| cache.clear())
            .unwrap_or(0);
        app_log!(info, "Cleared {} cached search pages for session {}", removed, session);
        removed
    }
}

fn clean_posting(mut job: JobPosting) -> JobPosting {
    job.description = html_to_text(&job.description);
    job
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::tests::posting;
    use crate::jobs::SourcePage;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSource {
        searches: AtomicUsize,
        fetches: AtomicUsize,
        failing: AtomicBool,
    }

    #[rocket::async_trait]
    impl JobSource for CountingSource {
        async fn search(&self, filters: &JobFilters) -> Result<SourcePage> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                anyhow::bail!("aggregator down");
            }
            let mut remote = posting("remote-1");
            remote.remote = true;
            remote.description = "<p>Remote <b>Rust</b> role</p>".to_string();
            let jobs = vec![posting(&format!("p{}-1", filters.page)), remote];
            Ok(SourcePage { jobs, total: 45 })
        }

        async fn fetch_job(&self, id: &str) -> Result<Option<JobPosting>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok((id == "known").then(|| posting("known")))
        }
    }

    fn service() -> (Arc<CountingSource>, JobSearchService) {
        let source = Arc::new(CountingSource::default());
        let service = JobSearchService::new(source.clone(), Duration::from_secs(5));
        (source, service)
    }

    fn filters(query: &str) -> JobFilters {
        JobFilters {
            query: query.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_same_search_hits_cache() {
        let (source, service) = service();

        let first = service.search("s1", &filters("rust")).await.unwrap();
        assert!(!first.from_cache);
        assert_eq!(first.total_pages, 3);
        assert!(first.has_more);

        let second = service.search("s1", &filters("  RUST ")).await.unwrap();
        assert!(second.from_cache);
        assert_eq!(second.jobs, first.jobs);
        assert_eq!(source.searches.load(Ordering::SeqCst), 1);

        let next_page = JobFilters {
            page: 2,
            ..filters("rust")
        };
        service.search("s1", &next_page).await.unwrap();
        assert_eq!(source.searches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clear_forces_fresh_call() {
        let (source, service) = service();
        service.search("s1", &filters("rust")).await.unwrap();
        assert_eq!(service.clear_cache("s1"), 1);
        service.search("s1", &filters("rust")).await.unwrap();
        assert_eq!(source.searches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_cache() {
        let (source, service) = service();
        service.search("s1", &filters("rust")).await.unwrap();
        service.search("s2", &filters("rust")).await.unwrap();
        assert_eq!(source.searches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_session_caches_stay_bounded() {
        let source = Arc::new(CountingSource::default());
        let service = JobSearchService::new(source.clone(), Duration::from_secs(5))
            .with_session_limits(Duration::from_secs(3600), 3);

        for i in 0..20 {
            service
                .search(&format!("visitor-{}", i), &filters("rust"))
                .await
                .unwrap();
        }
        assert_eq!(service.session_count(), 3);

        // The most recent session survived eviction with its page
        let page = service.search("visitor-19", &filters("rust")).await.unwrap();
        assert!(page.from_cache);
        assert_eq!(source.searches.load(Ordering::SeqCst), 20);
    }

    #[tokio::test]
    async fn test_idle_session_caches_are_dropped() {
        let (_, service) = service();
        let service = service.with_session_limits(Duration::ZERO, 100);
        service.search("s1", &filters("rust")).await.unwrap();
        service.search("s2", &filters("rust")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        service.search("s3", &filters("rust")).await.unwrap();
        assert_eq!(service.session_count(), 1);
    }

    #[tokio::test]
    async fn test_expired_page_is_stale_fallback() {
        let source = Arc::new(CountingSource::default());
        let service = JobSearchService::new(source.clone(), Duration::from_secs(5))
            .with_cache(Duration::ZERO, 10);

        service.search("s1", &filters("rust")).await.unwrap();
        source.failing.store(true, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;

        let page = service.search("s1", &filters("rust")).await.unwrap();
        assert!(page.stale);
        assert!(page.from_cache);

        assert!(service.search("s1", &filters("go")).await.is_err());
    }

    #[tokio::test]
    async fn test_descriptions_are_plain_text_and_post_filtered() {
        let (_, service) = service();
        let remote_only = JobFilters {
            remote: Some(true),
            ..filters("rust")
        };
        let page = service.search("s1", &remote_only).await.unwrap();
        assert_eq!(page.jobs.len(), 1);
        assert_eq!(page.jobs[0].description, "Remote Rust role");
    }

    #[tokio::test]
    async fn test_job_detail_uses_seen_results() {
        let (source, service) = service();
        service.search("s1", &filters("rust")).await.unwrap();

        let seen = service.get_job("s1", "p1-1").await.unwrap();
        assert!(seen.is_some());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);

        assert!(service.get_job("s1", "known").await.unwrap().is_some());
        assert!(service.get_job("s1", "missing").await.unwrap().is_none());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }
}
