//! IPO intake: a step-by-step registration wizard for an IPO prediction
//! service.
//!
//! Answers are validated per step, merged across steps and submitted to a
//! remote prediction service. When the service is unreachable the run still
//! ends in a stored, fully renderable offline outcome.

pub mod cli;
pub mod core;
pub mod schema;
