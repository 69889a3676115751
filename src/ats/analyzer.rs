// src/ats/analyzer.rs
//! Runs one analysis invocation through its phases and keeps the newest
//! result per session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use super::merge::{merge_results, ModelAssessment};
use super::{analyze_local, AnalysisResult, AnalysisSource, AtsPolicy};
use crate::ai::{AiAction, AiGenerator};
use crate::app_log;
use crate::core::SessionStore;
use crate::types::cv_data::CvDocument;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    #[default]
    Local,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisPhase {
    Idle,
    AnalyzingLocal,
    AnalyzingModel,
    Complete,
    LocalFallback,
}

impl AnalysisPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, AnalysisPhase::Complete | AnalysisPhase::LocalFallback)
    }

    fn can_advance_to(self, next: AnalysisPhase) -> bool {
        use AnalysisPhase::*;
        matches!(
            (self, next),
            (Idle, AnalyzingLocal)
                | (AnalyzingLocal, AnalyzingModel)
                | (AnalyzingLocal, Complete)
                | (AnalyzingLocal, LocalFallback)
                | (AnalyzingModel, Complete)
                | (AnalyzingModel, LocalFallback)
        )
    }
}

struct PhaseTracker {
    ticket: u64,
    history: Vec<AnalysisPhase>,
}

impl PhaseTracker {
    fn new(ticket: u64) -> Self {
        Self {
            ticket,
            history: vec![AnalysisPhase::Idle],
        }
    }

    fn current(&self) -> AnalysisPhase {
        self.history
            .last()
            .copied()
            .unwrap_or(AnalysisPhase::Idle)
    }

    fn advance(&mut self, next: AnalysisPhase) {
        let current = self.current();
        debug_assert!(
            current.can_advance_to(next),
            "illegal analysis transition {:?} -> {:?}",
            current,
            next
        );
        app_log!(trace, "Analysis #{}: {:?} -> {:?}", self.ticket, current, next);
        self.history.push(next);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub ticket: u64,
    pub mode: AnalysisMode,
    pub phase: AnalysisPhase,
    pub phases: Vec<AnalysisPhase>,
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    /// A newer analysis for the same session started before this one ended
    pub superseded: bool,
    pub completed_at: DateTime<Utc>,
    pub result: AnalysisResult,
}

struct SessionSlot {
    current_ticket: u64,
    latest: Option<AnalysisOutcome>,
}

pub struct AnalysisService {
    policy: AtsPolicy,
    model: Option<Arc<dyn AiGenerator>>,
    model_timeout: Duration,
    next_ticket: AtomicU64,
    sessions: Mutex<SessionStore<SessionSlot>>,
}

impl AnalysisService {
    pub fn new(policy: AtsPolicy) -> Self {
        Self {
            policy,
            model: None,
            model_timeout: Duration::from_secs(20),
            next_ticket: AtomicU64::new(1),
            sessions: Mutex::new(SessionStore::default()),
        }
    }

    pub fn with_model(mut self, model: Arc<dyn AiGenerator>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = timeout;
        self
    }

    pub fn with_session_limits(mut self, idle: Duration, max_sessions: usize) -> Self {
        self.sessions = Mutex::new(SessionStore::new(idle, max_sessions));
        self
    }

    pub fn session_count(&self) -> usize {
        self.slots().len()
    }

    pub fn policy(&self) -> &AtsPolicy {
        &self.policy
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, SessionStore<SessionSlot>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn begin(&self, session: &str) -> u64 {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        self.slots()
            .get_or_insert_with(session, Instant::now(), || SessionSlot {
                current_ticket: ticket,
                latest: None,
            })
            .current_ticket = ticket;
        ticket
    }

    /// Store the outcome unless a newer invocation owns the session.
    /// Returns whether the outcome was stale.
    fn finish(&self, session: &str, outcome: &AnalysisOutcome) -> bool {
        let mut slots = self.slots();
        // A slot evicted mid-analysis comes back owned by this ticket
        let slot = slots.get_or_insert_with(session, Instant::now(), || SessionSlot {
            current_ticket: outcome.ticket,
            latest: None,
        });
        if slot.current_ticket != outcome.ticket {
            return true;
        }
        slot.latest = Some(outcome.clone());
        false
    }

    /// Newest non-stale outcome for a session
    pub fn latest(&self, session: &str) -> Option<AnalysisOutcome> {
        self.slots()
            .get_mut(session, Instant::now())
            .and_then(|s| s.latest.clone())
    }

    /// Local scoring only; never touches the session state
    pub fn analyze_local(&self, cv: &CvDocument, job_description: Option<&str>) -> AnalysisResult {
        analyze_local(cv, job_description, &self.policy)
    }

    async fn assess_with_model(
        &self,
        cv: &CvDocument,
        job_description: Option<&str>,
    ) -> Result<ModelAssessment, String> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| "AI assessment service is not configured".to_string())?;

        let call = model.generate(AiAction::AtsAnalyze, cv, job_description, None);
        let raw = match tokio::time::timeout(self.model_timeout, call).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => return Err(format!("AI assessment failed: {}", e)),
            Err(_) => {
                return Err(format!(
                    "AI assessment timed out after {}s",
                    self.model_timeout.as_secs_f64()
                ))
            }
        };

        ModelAssessment::parse(&raw).map_err(|e| format!("AI assessment was malformed: {:#}", e))
    }

    /// Analyze a CV for a session. Hybrid mode degrades to the local result
    /// on any model problem; this never fails.
    pub async fn analyze(
        &self,
        session: &str,
        cv: &CvDocument,
        job_description: Option<&str>,
        mode: AnalysisMode,
    ) -> AnalysisOutcome {
        let ticket = self.begin(session);
        let mut tracker = PhaseTracker::new(ticket);

        tracker.advance(AnalysisPhase::AnalyzingLocal);
        let local = analyze_local(cv, job_description, &self.policy);

        let (result, fallback_reason) = match mode {
            AnalysisMode::Local => {
                tracker.advance(AnalysisPhase::Complete);
                (local, None)
            }
            AnalysisMode::Hybrid => {
                if self.model.is_some() {
                    tracker.advance(AnalysisPhase::AnalyzingModel);
                }
                match self.assess_with_model(cv, job_description).await {
                    Ok(assessment) => {
                        tracker.advance(AnalysisPhase::Complete);
                        (
                            merge_results(&local, &assessment, &self.policy.merge),
                            None,
                        )
                    }
                    Err(reason) => {
                        app_log!(warn, "Analysis #{} falling back to local: {}", ticket, reason);
                        tracker.advance(AnalysisPhase::LocalFallback);
                        let mut fallback = local;
                        fallback.source = AnalysisSource::LocalFallback;
                        (fallback, Some(reason))
                    }
                }
            }
        };

        let mut outcome = AnalysisOutcome {
            ticket,
            mode,
            phase: tracker.current(),
            phases: tracker.history,
            degraded: fallback_reason.is_some(),
            fallback_reason,
            superseded: false,
            completed_at: Utc::now(),
            result,
        };
        outcome.superseded = self.finish(session, &outcome);

        if outcome.superseded {
            app_log!(info, "Discarding stale analysis #{} for session {}", ticket, session);
        } else {
            app_log!(
                info,
                "Analysis #{} for session {} finished with score {} ({:?})",
                ticket,
                session,
                outcome.result.score,
                outcome.phase
            );
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::cv_data::Experience;
    use anyhow::Result;

    enum StubBehavior {
        Respond(&'static str),
        Fail,
        Hang,
    }

    struct StubModel {
        behavior: StubBehavior,
    }

    #[rocket::async_trait]
    impl AiGenerator for StubModel {
        async fn generate(
            &self,
            _action: AiAction,
            cv: &CvDocument,
            _job_description: Option<&str>,
            _context: Option<&str>,
        ) -> Result<String> {
            if cv.summary.contains("slow") {
                tokio::time::sleep(Duration::from_millis(150)).await;
            }
            match self.behavior {
                StubBehavior::Respond(body) => Ok(body.to_string()),
                StubBehavior::Fail => anyhow::bail!("connection refused"),
                StubBehavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(String::new())
                }
            }
        }
    }

    fn service(behavior: StubBehavior) -> AnalysisService {
        AnalysisService::new(AtsPolicy::default())
            .with_model(Arc::new(StubModel { behavior }))
            .with_model_timeout(Duration::from_millis(50))
    }

    fn sample_cv(summary: &str) -> CvDocument {
        CvDocument {
            summary: summary.to_string(),
            experience: vec![Experience {
                company: "Acme".to_string(),
                title: "Engineer".to_string(),
                achievements: vec!["Led a team of 5 engineers to reduce latency by 30%".to_string()],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_local_mode_completes() {
        let service = AnalysisService::new(AtsPolicy::default());
        let outcome = service
            .analyze("s1", &sample_cv("Engineer"), None, AnalysisMode::Local)
            .await;
        assert_eq!(
            outcome.phases,
            vec![
                AnalysisPhase::Idle,
                AnalysisPhase::AnalyzingLocal,
                AnalysisPhase::Complete
            ]
        );
        assert!(!outcome.degraded);
        assert_eq!(outcome.result.source, AnalysisSource::Local);
        assert_eq!(service.latest("s1"), Some(outcome));
    }

    #[tokio::test]
    async fn test_hybrid_merges_model_assessment() {
        let service = service(StubBehavior::Respond(r#"{"score": 80}"#));
        let cv = sample_cv("Engineer");
        let local = service.analyze_local(&cv, None);
        let outcome = service.analyze("s1", &cv, None, AnalysisMode::Hybrid).await;

        assert_eq!(outcome.phase, AnalysisPhase::Complete);
        assert_eq!(outcome.result.source, AnalysisSource::Hybrid);
        let expected = (f64::from(local.score) * 0.4 + 80.0 * 0.6).round() as u8;
        assert_eq!(outcome.result.score, expected);
    }

    #[tokio::test]
    async fn test_hybrid_falls_back_on_failure_timeout_and_garbage() {
        for behavior in [
            StubBehavior::Fail,
            StubBehavior::Hang,
            StubBehavior::Respond("not json at all"),
        ] {
            let service = service(behavior);
            let cv = sample_cv("Engineer");
            let outcome = service.analyze("s1", &cv, None, AnalysisMode::Hybrid).await;

            assert_eq!(outcome.phase, AnalysisPhase::LocalFallback);
            assert_eq!(
                outcome.phases,
                vec![
                    AnalysisPhase::Idle,
                    AnalysisPhase::AnalyzingLocal,
                    AnalysisPhase::AnalyzingModel,
                    AnalysisPhase::LocalFallback
                ]
            );
            assert!(outcome.degraded);
            assert!(outcome.fallback_reason.is_some());
            assert_eq!(outcome.result.source, AnalysisSource::LocalFallback);
            assert_eq!(outcome.result.score, service.analyze_local(&cv, None).score);
        }
    }

    #[tokio::test]
    async fn test_hybrid_without_model_is_local_fallback() {
        let service = AnalysisService::new(AtsPolicy::default());
        let outcome = service
            .analyze("s1", &sample_cv("Engineer"), None, AnalysisMode::Hybrid)
            .await;
        assert_eq!(outcome.phase, AnalysisPhase::LocalFallback);
        assert!(outcome.phase.is_terminal());
    }

    #[tokio::test]
    async fn test_stale_result_never_overwrites_newer() {
        let service = service(StubBehavior::Respond(r#"{"score": 10}"#));
        let slow_cv = sample_cv("slow first request");
        let fast_cv = sample_cv("second request");

        let (first, second) = tokio::join!(
            service.analyze("s1", &slow_cv, None, AnalysisMode::Local),
            service.analyze("s1", &fast_cv, None, AnalysisMode::Local),
        );
        assert!(!first.superseded || first.ticket < second.ticket);
        assert!(!second.superseded);
        assert_eq!(service.latest("s1").map(|o| o.ticket), Some(second.ticket));

        let service = self::service(StubBehavior::Respond(r#"{"score": 10}"#))
            .with_model_timeout(Duration::from_secs(5));
        let (first, second) = tokio::join!(
            service.analyze("s2", &slow_cv, None, AnalysisMode::Hybrid),
            service.analyze("s2", &fast_cv, None, AnalysisMode::Hybrid),
        );
        assert!(first.superseded);
        assert!(!second.superseded);
        assert_eq!(service.latest("s2").map(|o| o.ticket), Some(second.ticket));
    }

    #[tokio::test]
    async fn test_session_results_stay_bounded() {
        let service = AnalysisService::new(AtsPolicy::default())
            .with_session_limits(Duration::from_secs(3600), 2);
        let cv = sample_cv("Engineer");
        for session in ["a", "b", "c", "d"] {
            let outcome = service.analyze(session, &cv, None, AnalysisMode::Local).await;
            assert!(!outcome.superseded);
        }

        assert_eq!(service.session_count(), 2);
        assert!(service.latest("a").is_none());
        assert!(service.latest("d").is_some());
    }

    #[tokio::test]
    async fn test_evicted_session_still_stores_its_result() {
        let service = service(StubBehavior::Respond(r#"{"score": 70}"#))
            .with_model_timeout(Duration::from_secs(5))
            .with_session_limits(Duration::from_secs(3600), 1);
        let slow_cv = sample_cv("slow request");
        let cv = sample_cv("Engineer");

        let (first, _) = tokio::join!(
            service.analyze("a", &slow_cv, None, AnalysisMode::Hybrid),
            service.analyze("b", &cv, None, AnalysisMode::Local),
        );
        assert!(!first.superseded);
        assert_eq!(service.latest("a").map(|o| o.ticket), Some(first.ticket));
    }
}
