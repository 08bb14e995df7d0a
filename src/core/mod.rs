//! Core module - wizard state, submission pipeline and result views

pub mod client;
pub mod config;
pub mod identity;
pub mod orchestrator;
pub mod outcome;
pub mod payload;
pub mod report;
pub mod results;
pub mod store;
pub mod wizard;

pub use client::{HttpPredictionClient, PredictionService};
pub use config::{Config, ConfigError};
pub use identity::{FieldKey, IdParseError, RunId, StepId};
pub use orchestrator::{SubmissionOrchestrator, SubmissionReport, SubmissionTicket, WriteStatus};
pub use outcome::{OutcomeRecord, PredictionResponse, SubmissionError, SubmissionOutcome};
pub use payload::SubmissionPayload;
pub use report::ExportError;
pub use results::{ResultStatus, ResultViewModel, RiskBand};
pub use store::{FileOutcomeStore, GuardedSave, MemoryOutcomeStore, OutcomeStore, StoreError};
pub use wizard::{AccumulatedData, Transition, WizardController, WizardError, WizardPhase};
