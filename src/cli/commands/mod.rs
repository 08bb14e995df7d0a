//! CLI command implementations

pub mod completions;
pub mod config;
pub mod register;
pub mod report;
pub mod reset;
pub mod results;
pub mod schema;
pub mod share;
