//! Submission orchestrator - probe, submit, fall back, persist
//!
//! This is the only component that talks to the network or writes the
//! durable record. Failures never escape as errors: every attempt ends in a
//! `SubmissionOutcome`, and the caller always gets something to render.

use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::core::client::PredictionService;
use crate::core::identity::RunId;
use crate::core::outcome::{PredictionResponse, SubmissionError, SubmissionOutcome};
use crate::core::payload::SubmissionPayload;
use crate::core::store::{GuardedSave, OutcomeStore, StoreError};
use crate::core::wizard::AccumulatedData;

/// Identity of one in-flight submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionTicket {
    pub run_id: RunId,
    pub generation: u64,
}

/// What happened to the durable record after an attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    /// The outcome is now the stored record
    Persisted,
    /// A newer submission started meanwhile; this outcome was discarded
    Superseded { latest: u64 },
    /// The store rejected the write
    Failed(String),
}

/// Outcome of `submit` plus the persistence result
#[derive(Debug, Clone)]
pub struct SubmissionReport {
    pub outcome: SubmissionOutcome,
    pub generation: u64,
    pub write: WriteStatus,
}

/// Runs submissions against a prediction service and records the latest one.
///
/// Generations are claimed from the store, so orchestrators in different
/// processes sharing one store still order their writes.
pub struct SubmissionOrchestrator {
    service: Box<dyn PredictionService>,
    store: Arc<dyn OutcomeStore>,
}

impl SubmissionOrchestrator {
    pub fn new(service: Box<dyn PredictionService>, store: Arc<dyn OutcomeStore>) -> Self {
        Self { service, store }
    }

    /// Claim a new generation; any older ticket becomes stale
    pub fn begin(&self) -> Result<SubmissionTicket, StoreError> {
        let generation = self.store.claim_generation()?;
        Ok(SubmissionTicket {
            run_id: RunId::new(),
            generation,
        })
    }

    /// Flatten, probe and submit without touching the store
    pub fn attempt(&self, ticket: &SubmissionTicket, data: &AccumulatedData) -> SubmissionOutcome {
        let payload = SubmissionPayload::from_accumulated(data);
        let run_id = ticket.run_id.clone();

        let result = self
            .service
            .health_check()
            .and_then(|()| self.service.predict(&payload))
            .and_then(|raw| PredictionResponse::from_value(&raw).map(|response| (raw, response)));

        match result {
            Ok((raw, response)) => {
                info!(
                    run = %run_id,
                    has_predictions = response.has_predictions(),
                    "prediction service accepted submission"
                );
                SubmissionOutcome::Succeeded {
                    run_id,
                    payload,
                    raw,
                    response,
                    submitted_at: Utc::now(),
                }
            }
            Err(err) => {
                warn!(run = %run_id, kind = err.kind(), error = %err, "submission degraded to offline");
                SubmissionOutcome::Failed {
                    run_id,
                    payload,
                    error: err,
                    submitted_at: Utc::now(),
                }
            }
        }
    }

    /// Persist the outcome if the ticket is still the latest one
    pub fn complete(&self, ticket: &SubmissionTicket, outcome: &SubmissionOutcome) -> WriteStatus {
        match self.store.save_if_current(&outcome.to_record(ticket.generation)) {
            Ok(GuardedSave::Saved) => WriteStatus::Persisted,
            Ok(GuardedSave::Superseded { latest }) => {
                warn!(
                    generation = ticket.generation,
                    latest, "discarding outcome of superseded submission"
                );
                WriteStatus::Superseded { latest }
            }
            Err(e) => {
                error!(error = %e, "failed to persist submission outcome");
                WriteStatus::Failed(e.to_string())
            }
        }
    }

    /// Run one full submission: claim, attempt, persist.
    /// A store that cannot issue a generation still gets an attempt; only
    /// the write is skipped.
    pub fn submit(&self, data: &AccumulatedData) -> SubmissionReport {
        match self.begin() {
            Ok(ticket) => {
                let outcome = self.attempt(&ticket, data);
                let write = self.complete(&ticket, &outcome);
                SubmissionReport {
                    outcome,
                    generation: ticket.generation,
                    write,
                }
            }
            Err(e) => {
                error!(error = %e, "could not claim a submission generation");
                let ticket = SubmissionTicket {
                    run_id: RunId::new(),
                    generation: 0,
                };
                SubmissionReport {
                    outcome: self.attempt(&ticket, data),
                    generation: ticket.generation,
                    write: WriteStatus::Failed(e.to_string()),
                }
            }
        }
    }
}

impl std::fmt::Debug for SubmissionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionOrchestrator").finish_non_exhaustive()
    }
}

/// Convenience for callers that only need the error of a failed outcome
pub fn failure_reason(outcome: &SubmissionOutcome) -> Option<&SubmissionError> {
    match outcome {
        SubmissionOutcome::Failed { error, .. } => Some(error),
        SubmissionOutcome::Succeeded { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::FieldKey;
    use crate::core::outcome::CallStage;
    use crate::core::store::{FileOutcomeStore, MemoryOutcomeStore};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Scripted service that counts calls
    struct StubService {
        healthy: bool,
        reply: Result<Value, SubmissionError>,
        predict_calls: Arc<AtomicUsize>,
        seen: Arc<Mutex<Option<SubmissionPayload>>>,
    }

    impl StubService {
        fn new(healthy: bool, reply: Result<Value, SubmissionError>) -> Self {
            Self {
                healthy,
                reply,
                predict_calls: Arc::new(AtomicUsize::new(0)),
                seen: Arc::new(Mutex::new(None)),
            }
        }
    }

    impl PredictionService for StubService {
        fn health_check(&self) -> Result<(), SubmissionError> {
            if self.healthy {
                Ok(())
            } else {
                Err(SubmissionError::Connectivity {
                    stage: CallStage::Probe,
                    message: "connection refused".to_string(),
                })
            }
        }

        fn predict(&self, payload: &SubmissionPayload) -> Result<Value, SubmissionError> {
            self.predict_calls.fetch_add(1, Ordering::SeqCst);
            *self.seen.lock().unwrap() = Some(payload.clone());
            self.reply.clone()
        }
    }

    fn answers() -> AccumulatedData {
        [
            (FieldKey::CompanyName, "Acme"),
            (FieldKey::FirmAge, "5"),
            (FieldKey::IssueYear, "2024"),
        ]
        .into_iter()
        .map(|(k, v)| (k, v.to_string()))
        .collect()
    }

    fn orchestrator(service: StubService) -> (SubmissionOrchestrator, Arc<MemoryOutcomeStore>) {
        let store = Arc::new(MemoryOutcomeStore::new());
        let orch = SubmissionOrchestrator::new(Box::new(service), store.clone());
        (orch, store)
    }

    #[test]
    fn test_failed_probe_skips_prediction() {
        let service = StubService::new(false, Ok(json!({})));
        let calls = service.predict_calls.clone();
        let (orch, store) = orchestrator(service);

        let report = orch.submit(&answers());

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        match &report.outcome {
            SubmissionOutcome::Failed { payload, error, .. } => {
                assert_eq!(payload.company_name, "Acme");
                assert_eq!(payload.age, "5");
                assert_eq!(error.kind(), "connectivity");
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(report.write, WriteStatus::Persisted);
        let record = store.load().unwrap().unwrap();
        assert_eq!(record.offline, Some(true));
        assert_eq!(record.submission_data.company_name, "Acme");
    }

    #[test]
    fn test_success_is_recorded() {
        let service = StubService::new(
            true,
            Ok(json!({"prediction": {
                "predictedOfferPrice": 12.5,
                "predictedCloseDay1": 14.0,
                "predictionStatus": "completed"
            }})),
        );
        let seen = service.seen.clone();
        let (orch, store) = orchestrator(service);

        let report = orch.submit(&answers());

        assert!(report.outcome.is_success());
        assert_eq!(report.generation, 1);
        let sent = seen.lock().unwrap().clone().unwrap();
        assert_eq!(sent.year, "2024");
        assert_eq!(sent.high_tech, "false");
        let record = store.load().unwrap().unwrap();
        assert_eq!(record.has_predictions, Some(true));
        assert!(record.is_online());
    }

    #[test]
    fn test_service_error_degrades() {
        let service = StubService::new(
            true,
            Err(SubmissionError::Status {
                stage: CallStage::Predict,
                status: 500,
                body: "boom".to_string(),
            }),
        );
        let (orch, store) = orchestrator(service);
        let report = orch.submit(&answers());
        assert_eq!(
            failure_reason(&report.outcome).map(|e| e.kind()),
            Some("http_status")
        );
        assert_eq!(store.load().unwrap().unwrap().error_kind.as_deref(), Some("http_status"));
    }

    #[test]
    fn test_malformed_response_degrades() {
        let service = StubService::new(true, Ok(json!({"status": "ok"})));
        let (orch, _store) = orchestrator(service);
        let report = orch.submit(&answers());
        assert_eq!(
            failure_reason(&report.outcome).map(|e| e.kind()),
            Some("malformed_response")
        );
    }

    #[test]
    fn test_new_outcome_overwrites_previous() {
        let (orch, store) = orchestrator(StubService::new(false, Ok(json!({}))));
        orch.submit(&answers());
        let mut changed = answers();
        changed.insert(FieldKey::CompanyName, "Globex".to_string());
        orch.submit(&changed);
        let record = store.load().unwrap().unwrap();
        assert_eq!(record.submission_data.company_name, "Globex");
        assert_eq!(record.generation, 2);
    }

    #[test]
    fn test_stale_ticket_is_not_persisted() {
        let (orch, store) = orchestrator(StubService::new(false, Ok(json!({}))));

        let first = orch.begin().unwrap();
        let second = orch.begin().unwrap();

        let newer = orch.attempt(&second, &answers());
        assert_eq!(orch.complete(&second, &newer), WriteStatus::Persisted);

        let mut stale_data = answers();
        stale_data.insert(FieldKey::CompanyName, "Stale".to_string());
        let older = orch.attempt(&first, &stale_data);
        assert_eq!(
            orch.complete(&first, &older),
            WriteStatus::Superseded { latest: second.generation }
        );

        let record = store.load().unwrap().unwrap();
        assert_eq!(record.submission_data.company_name, "Acme");
        assert_eq!(record.generation, second.generation);
    }

    #[test]
    fn test_generation_continues_from_store() {
        let store = Arc::new(MemoryOutcomeStore::new());
        let first = SubmissionOrchestrator::new(
            Box::new(StubService::new(false, Ok(json!({})))),
            store.clone(),
        );
        first.submit(&answers());
        first.submit(&answers());

        let second = SubmissionOrchestrator::new(
            Box::new(StubService::new(false, Ok(json!({})))),
            store.clone(),
        );
        assert_eq!(second.begin().unwrap().generation, 3);
    }

    #[test]
    fn test_overlapping_runs_on_shared_file_store() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("registration-data.json");
        let older_run = SubmissionOrchestrator::new(
            Box::new(StubService::new(false, Ok(json!({})))),
            Arc::new(FileOutcomeStore::new(&path)),
        );
        let newer_run = SubmissionOrchestrator::new(
            Box::new(StubService::new(false, Ok(json!({})))),
            Arc::new(FileOutcomeStore::new(&path)),
        );

        let older = older_run.begin().unwrap();
        let newer = newer_run.begin().unwrap();
        assert!(newer.generation > older.generation);

        let mut newer_data = answers();
        newer_data.insert(FieldKey::CompanyName, "Newer".to_string());
        let outcome = newer_run.attempt(&newer, &newer_data);
        assert_eq!(newer_run.complete(&newer, &outcome), WriteStatus::Persisted);

        let mut older_data = answers();
        older_data.insert(FieldKey::CompanyName, "Older".to_string());
        let outcome = older_run.attempt(&older, &older_data);
        assert_eq!(
            older_run.complete(&older, &outcome),
            WriteStatus::Superseded { latest: newer.generation }
        );

        let record = FileOutcomeStore::new(&path).load().unwrap().unwrap();
        assert_eq!(record.submission_data.company_name, "Newer");
        assert_eq!(record.generation, newer.generation);
    }

    /// Store whose writes and claims always fail
    struct ReadOnlyStore;

    impl OutcomeStore for ReadOnlyStore {
        fn load(&self) -> Result<Option<crate::core::outcome::OutcomeRecord>, StoreError> {
            Ok(None)
        }
        fn save(&self, _: &crate::core::outcome::OutcomeRecord) -> Result<(), StoreError> {
            Err(StoreError::Poisoned)
        }
        fn clear(&self) -> Result<(), StoreError> {
            Ok(())
        }
        fn claim_generation(&self) -> Result<u64, StoreError> {
            Err(StoreError::Poisoned)
        }
        fn save_if_current(
            &self,
            _: &crate::core::outcome::OutcomeRecord,
        ) -> Result<GuardedSave, StoreError> {
            Err(StoreError::Poisoned)
        }
    }

    #[test]
    fn test_unclaimable_store_still_attempts() {
        let service = StubService::new(true, Ok(json!({"prediction": {"predictedOfferPrice": 10}})));
        let calls = service.predict_calls.clone();
        let orch = SubmissionOrchestrator::new(Box::new(service), Arc::new(ReadOnlyStore));

        let report = orch.submit(&answers());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(report.outcome.is_success());
        assert!(matches!(report.write, WriteStatus::Failed(_)));
    }
}
