//! Schema system - field registry, step validation, prompts and templates

pub mod registry;
pub mod template;
pub mod validator;
pub mod wizard;

pub use registry::{FieldKind, FieldSpec, SchemaRegistry, StepDefinition};
pub use template::{TemplateError, TemplateGenerator};
pub use validator::{FieldViolation, StepValidationError, StepValidator, StepValues};
pub use wizard::PromptWizard;
