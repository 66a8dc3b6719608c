//! # Trace Query
//!
//! Translates a free-form description of a distributed-trace search into a
//! structured query for the trace search API, using a local text-generation
//! model and the trace backend's own service metadata.
//!
//! ## Pipeline
//!
//! - `ServiceCatalog`: lazily cached services and their routes
//! - `PromptBuilder`: fixed instruction template filled with metadata and the user's text
//! - `GenerationClient`: liveness check and completion, each under a hard timeout
//! - `parser`: recovers one JSON object from the generated text
//! - `QueryValidator`: normalizes the candidate against format rules and the catalog
//! - `Translator`: runs the steps in order; the only entry point callers need
//!
//! ```no_run
//! # async fn demo() -> trace_query::Result<()> {
//! use trace_query::{Translator, TranslationContext};
//!
//! let translator = Translator::from_env()?;
//! let query = translator
//!     .translate_query("slowest traces for payment in the last 2 hours", None)
//!     .await?;
//!
//! let narrowed = TranslationContext::with_service("auth-service");
//! let login_errors = translator
//!     .translate_query("failed logins", Some(&narrowed))
//!     .await?;
//! # let _ = (query, login_errors);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub use self::core::{ClientBuilder, MetadataSource, TextGenerator};

pub mod services;
pub use services::{jaeger, ollama};

pub mod error;
pub use error::{ErrorContext, ErrorKind, Result, TranslateError};

pub mod config;
pub use config::{ConfigProvider, ServiceConfig, TranslatorConfig};

pub mod catalog;
pub use catalog::{CatalogSnapshot, ServiceCatalog};

pub mod parser;

pub mod prompt;
pub use prompt::{MetadataView, PromptBuilder};

pub mod query;
pub use query::{StructuredQuery, TranslationContext};

pub mod translator;
pub use translator::Translator;

pub mod validator;
pub use validator::{QueryValidator, ValidationMode};

mod util;

#[cfg(test)]
mod tests;
