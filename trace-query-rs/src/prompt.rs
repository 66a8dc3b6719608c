//! Prompt rendering
//!
//! The instruction template is a fixed asset carrying the output schema and
//! few-shot examples. Rendering only fills `{services}` and `{query}`.

use std::collections::{BTreeMap, BTreeSet};

/// Instruction template shipped with the crate
pub const DEFAULT_TEMPLATE: &str = include_str!("../prompts/trace_query.txt");

pub const SERVICES_PLACEHOLDER: &str = "{services}";
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// Service metadata as shown to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataView {
    /// A service was picked in the search form: only its routes
    Narrowed {
        service: String,
        routes: Vec<String>,
    },

    /// Every known service with its routes
    Full(Vec<(String, Vec<String>)>),
}

impl MetadataView {
    /// Build the view for an optional selected service
    pub fn from_catalog(
        catalog: &BTreeMap<String, BTreeSet<String>>,
        selected_service: Option<&str>,
    ) -> Self {
        match selected_service {
            Some(service) => MetadataView::Narrowed {
                service: service.to_string(),
                routes: catalog
                    .get(service)
                    .map(|routes| routes.iter().cloned().collect())
                    .unwrap_or_default(),
            },
            None => MetadataView::Full(
                catalog
                    .iter()
                    .map(|(service, routes)| (service.clone(), routes.iter().cloned().collect()))
                    .collect(),
            ),
        }
    }

    /// Text substituted for `{services}`
    pub fn render(&self) -> String {
        match self {
            MetadataView::Narrowed { service, routes } => format!(
                "Selected service: {}\nAvailable routes: {}",
                service,
                join_routes(routes)
            ),
            MetadataView::Full(services) => services
                .iter()
                .map(|(name, routes)| format!("{} (routes: {})", name, join_routes(routes)))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

fn join_routes(routes: &[String]) -> String {
    if routes.is_empty() {
        "none".to_string()
    } else {
        routes.join(", ")
    }
}

/// Renders prompts from a template
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    template: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom template; it should contain both placeholders
    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Render the prompt for `user_query` against `view`
    pub fn render(&self, view: &MetadataView, user_query: &str) -> String {
        render(&self.template, view, user_query)
    }
}

/// Substitute the first `{services}` and the first `{query}` of `template`.
///
/// Both positions are located in the template before anything is inserted,
/// so placeholder-looking text inside the metadata or the user's query is
/// never expanded.
pub fn render(template: &str, view: &MetadataView, user_query: &str) -> String {
    let services = view.render();

    let mut slots: Vec<(usize, usize, &str)> = Vec::with_capacity(2);
    if let Some(at) = template.find(SERVICES_PLACEHOLDER) {
        slots.push((at, SERVICES_PLACEHOLDER.len(), services.as_str()));
    }
    if let Some(at) = template.find(QUERY_PLACEHOLDER) {
        slots.push((at, QUERY_PLACEHOLDER.len(), user_query));
    }
    slots.sort_by_key(|(at, _, _)| *at);

    let mut out = String::with_capacity(template.len() + services.len() + user_query.len());
    let mut cursor = 0;
    for (at, len, value) in slots {
        out.push_str(&template[cursor..at]);
        out.push_str(value);
        cursor = at + len;
    }
    out.push_str(&template[cursor..]);

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> BTreeMap<String, BTreeSet<String>> {
        let mut catalog = BTreeMap::new();
        catalog.insert(
            "auth-service".to_string(),
            ["/v1/login", "/v1/logout"].iter().map(|s| s.to_string()).collect(),
        );
        catalog.insert("payment".to_string(), BTreeSet::new());
        catalog
    }

    #[test]
    fn test_full_view() {
        let view = MetadataView::from_catalog(&catalog(), None);
        assert_eq!(
            view.render(),
            "auth-service (routes: /v1/login, /v1/logout)\npayment (routes: none)"
        );
    }

    #[test]
    fn test_narrowed_view() {
        let view = MetadataView::from_catalog(&catalog(), Some("auth-service"));
        assert_eq!(
            view.render(),
            "Selected service: auth-service\nAvailable routes: /v1/login, /v1/logout"
        );

        let unknown = MetadataView::from_catalog(&catalog(), Some("ghost"));
        assert_eq!(unknown.render(), "Selected service: ghost\nAvailable routes: none");
    }

    #[test]
    fn test_render_substitutes_each_placeholder_once() {
        let view = MetadataView::Full(vec![("cart".to_string(), vec![])]);
        let prompt = render("S={services} Q={query} again={query}", &view, "errors in cart");
        assert_eq!(prompt, "S=cart (routes: none) Q=errors in cart again={query}");
    }

    #[test]
    fn test_render_does_not_expand_user_text() {
        let view = MetadataView::Full(vec![("cart".to_string(), vec![])]);
        let prompt = render("{query} | {services}", &view, "literal {services}");
        assert_eq!(prompt, "literal {services} | cart (routes: none)");
    }

    #[test]
    fn test_default_template_has_placeholders() {
        let builder = PromptBuilder::new();
        assert!(builder.template().contains(SERVICES_PLACEHOLDER));
        assert!(builder.template().contains(QUERY_PLACEHOLDER));

        let prompt = builder.render(&MetadataView::from_catalog(&catalog(), None), "slow logins");
        assert!(prompt.contains("auth-service (routes: /v1/login, /v1/logout)"));
        assert!(prompt.trim_end().ends_with("Request: slow logins"));
    }
}
