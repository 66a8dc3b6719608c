//! Translation orchestrator
//!
//! The single entry point the search form calls. Steps run in a fixed
//! order and the first failure ends the translation:
//! catalog -> liveness -> prompt -> generation -> extraction -> validation.

use std::sync::Arc;

use log::{debug, error, info};

use crate::catalog::ServiceCatalog;
use crate::config::TranslatorConfig;
use crate::core::{MetadataSource, TextGenerator};
use crate::error::{ErrorContext, Result};
use crate::parser;
use crate::prompt::{MetadataView, PromptBuilder};
use crate::query::{StructuredQuery, TranslationContext};
use crate::services::jaeger::MetadataClient;
use crate::services::ollama::GenerationClient;
use crate::util::{generate_request_id, measure_time_async};
use crate::validator::{QueryValidator, ValidationMode};

/// Natural-language to trace query translator
pub struct Translator {
    catalog: ServiceCatalog,
    generator: Arc<dyn TextGenerator>,
    prompts: PromptBuilder,
    validator: QueryValidator,
}

impl Translator {
    /// Assemble a translator from its collaborators
    pub fn new(
        metadata: Arc<dyn MetadataSource>,
        generator: Arc<dyn TextGenerator>,
        prompts: PromptBuilder,
        validator: QueryValidator,
    ) -> Self {
        Self {
            catalog: ServiceCatalog::new(metadata),
            generator,
            prompts,
            validator,
        }
    }

    /// Build the HTTP clients described by `config`
    pub fn from_config(config: TranslatorConfig) -> Result<Self> {
        let metadata = MetadataClient::new_with_config(config.metadata)?;
        let generator = GenerationClient::new_with_config(config.generation)?;
        let mode = if config.route_validation {
            ValidationMode::RouteAware
        } else {
            ValidationMode::OperationName
        };

        Ok(Self::new(
            Arc::new(metadata),
            Arc::new(generator),
            PromptBuilder::default(),
            QueryValidator::new(mode),
        ))
    }

    /// Build from the process environment (`TRACE_QUERY_*`, `.env`)
    pub fn from_env() -> Result<Self> {
        Self::from_config(TranslatorConfig::from_env()?)
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    /// Translate free text into a validated trace query
    pub async fn translate_query(
        &self,
        query: &str,
        context: Option<&TranslationContext>,
    ) -> Result<StructuredQuery> {
        let request_id = generate_request_id();
        debug!("[{}] Translating query: {}", request_id, query);

        match self.run(query, context).await {
            Ok(structured) => {
                info!("[{}] Translated query: {:?}", request_id, structured);
                Ok(structured)
            }
            Err(e) => {
                error!("[{}] Translation failed: {}", request_id, e);
                Err(e.with_context(ErrorContext::new().request_id(request_id)))
            }
        }
    }

    async fn run(
        &self,
        query: &str,
        context: Option<&TranslationContext>,
    ) -> Result<StructuredQuery> {
        let (loaded, elapsed) = measure_time_async(|| self.catalog.ensure_loaded()).await;
        loaded?;
        debug!("Catalog ready in {:?}", elapsed);

        self.generator.check_health().await?;

        let snapshot = self.catalog.snapshot().await;
        let view = MetadataView::from_catalog(
            snapshot.entries(),
            context.and_then(TranslationContext::service),
        );
        let prompt = self.prompts.render(&view, query);

        let (raw, elapsed) = measure_time_async(|| self.generator.generate(&prompt)).await;
        let raw = raw?;
        debug!("Generation finished in {:?}", elapsed);

        let candidate = parser::extract(&raw)?;
        self.validator.normalize(&candidate, &snapshot, context)
    }
}
