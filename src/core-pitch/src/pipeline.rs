//! The personalization pipeline: extract, prompt, complete, parse, splice, then the logo.

use serde::Serialize;

use crate::extract::extract_text_nodes;
use crate::fields::{ClientFields, fill_placeholders};
use crate::llms::{CompletionRequest, LlmProvider, prompt_client_fields, prompt_custom, system_prompt};
use crate::logo::inject_logo;
use crate::parse::parse_response;
use crate::splice::splice_counting;

/// What to personalize the template for.
#[derive(Debug, Clone, Copy)]
pub struct PersonalizeRequest<'a> {
    /// Free-form instruction. When blank, the prompt is built from `fields` instead.
    pub prompt: &'a str,
    pub fields: &'a ClientFields,
    /// Already resolved logo URL.
    pub logo_url: Option<&'a str>,
}

/// How a page came to be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Outcome {
    /// The LLM answered; `changed` of `total` texts were rewritten in the page.
    Personalized { changed: usize, total: usize },
    /// The template has no text the extractor recognizes.
    NoTextNodes,
    /// Placeholders were filled in instead of asking the LLM.
    Fallback { reason: String },
}

#[derive(Debug, Clone)]
pub struct Personalization {
    pub html: String,
    pub outcome: Outcome,
}

/// Runs the whole pipeline over `template`.
///
/// Never fails: without a provider, or when prompting or completion fails, the template's
/// `{{cliente.*}}` placeholders are filled from the request fields instead. The logo, when
/// given, is injected whatever happened before.
pub async fn personalize(
    provider: Option<&dyn LlmProvider>,
    template: &str,
    request: &PersonalizeRequest<'_>,
) -> Personalization {
    let mut result = match provider {
        Some(provider) => personalize_texts(provider, template, request).await,
        None => {
            tracing::warn!("No LLM provider configured, filling placeholders only");
            fallback(template, request.fields, "no LLM provider configured".to_string())
        }
    };

    if let Some(url) = request.logo_url {
        result.html = inject_logo(&result.html, url);
    }
    result
}

async fn personalize_texts(
    provider: &dyn LlmProvider,
    template: &str,
    request: &PersonalizeRequest<'_>,
) -> Personalization {
    let nodes = extract_text_nodes(template);
    if nodes.is_empty() {
        tracing::warn!("Template has no extractable text, returning it unchanged");
        return Personalization {
            html: template.to_string(),
            outcome: Outcome::NoTextNodes,
        };
    }

    let user_prompt = if request.prompt.trim().is_empty() {
        prompt_client_fields(request.fields, &nodes)
    } else {
        prompt_custom(request.prompt, &nodes)
    };
    let user_prompt = match user_prompt {
        Ok(prompt) => prompt,
        Err(e) => {
            tracing::error!("Failed to build personalization prompt: {}", e);
            return fallback(template, request.fields, e.to_string());
        }
    };

    let completion = CompletionRequest::for_texts(system_prompt(), user_prompt, nodes.len());
    let raw = match provider.complete(&completion).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!("LLM personalization failed: {}", e);
            return fallback(template, request.fields, e.to_string());
        }
    };

    let personalized = parse_response(&raw, &nodes);
    let (html, changed) = splice_counting(template, &personalized);
    tracing::info!("Personalized {} of {} texts", changed, nodes.len());

    Personalization {
        html,
        outcome: Outcome::Personalized {
            changed,
            total: nodes.len(),
        },
    }
}

fn fallback(template: &str, fields: &ClientFields, reason: String) -> Personalization {
    Personalization {
        html: fill_placeholders(template, fields),
        outcome: Outcome::Fallback { reason },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llms::max_tokens_for;
    use crate::llms::mock::{MockLlmProvider, sample_template, sample_template_response};

    fn request<'a>(prompt: &'a str, fields: &'a ClientFields, logo_url: Option<&'a str>) -> PersonalizeRequest<'a> {
        PersonalizeRequest {
            prompt,
            fields,
            logo_url,
        }
    }

    #[tokio::test]
    async fn test_hello_world() {
        let provider = MockLlmProvider::with_default("1. [h1] Hola\n2. [p] Mundo");
        let fields = ClientFields::default();
        let result = personalize(
            Some(&provider),
            "<h1>Hello</h1><p>World</p>",
            &request("Traduce al español", &fields, None),
        )
        .await;

        assert_eq!(result.html, "<h1>Hola</h1><p>Mundo</p>");
        assert_eq!(result.outcome, Outcome::Personalized { changed: 2, total: 2 });
    }

    #[tokio::test]
    async fn test_sample_template_keeps_code_and_structure() {
        let provider = MockLlmProvider::with_default(sample_template_response());
        let fields = ClientFields::default();
        let result = personalize(
            Some(&provider),
            sample_template(),
            &request("Página para Acme Motors", &fields, None),
        )
        .await;

        assert!(result.html.contains("<h2>Objetivos de Acme</h2>"));
        assert!(result.html.contains("<li>Reforzar la marca Acme</li>"));
        assert!(result.html.contains(r#"<div class="circuit-step-description">Analizamos el negocio de Acme.</div>"#));
        assert!(result.html.contains(r#"car.innerHTML = "<p>3D</p>";"#));
        assert!(result.html.contains(".hidden { display: none; }"));
        assert_eq!(result.outcome, Outcome::Personalized { changed: 7, total: 8 });
    }

    #[tokio::test]
    async fn test_changed_counts_rewrites_that_reach_the_page() {
        let provider = MockLlmProvider::with_default("1. [h3] A\n2. [circuit-step-title] B");
        let fields = ClientFields::default();
        let result = personalize(
            Some(&provider),
            r#"<h3 class="circuit-step-title">Launch</h3>"#,
            &request("Acme", &fields, None),
        )
        .await;

        assert_eq!(result.html, r#"<h3 class="circuit-step-title">B</h3>"#);
        assert_eq!(result.outcome, Outcome::Personalized { changed: 1, total: 2 });
    }

    #[tokio::test]
    async fn test_request_carries_numbered_texts_and_budget() {
        let provider = MockLlmProvider::with_default("1. [h1] Hola\n2. [p] Mundo");
        let fields = ClientFields::default();
        personalize(
            Some(&provider),
            "<h1>Hello</h1><p>World</p>",
            &request("Para una panadería", &fields, None),
        )
        .await;

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].user.starts_with("Para una panadería"));
        assert!(requests[0].user.contains("1. [h1] Hello\n2. [p] World"));
        assert_eq!(requests[0].max_tokens, max_tokens_for(2));
        assert_eq!(requests[0].temperature, 0.3);
    }

    #[tokio::test]
    async fn test_blank_prompt_uses_client_fields() {
        let provider = MockLlmProvider::with_default("1. [h1] Hola");
        let fields = ClientFields {
            company: Some("Acme".to_string()),
            ..Default::default()
        };
        personalize(Some(&provider), "<h1>Hello</h1>", &request("  ", &fields, None)).await;
        assert!(provider.requests()[0].user.contains("Empresa: Acme"));
    }

    #[tokio::test]
    async fn test_missing_lines_keep_original_text() {
        let provider = MockLlmProvider::with_default("2. [p] Mundo");
        let fields = ClientFields::default();
        let result = personalize(
            Some(&provider),
            "<h1>Hello</h1><p>World</p>",
            &request("x", &fields, None),
        )
        .await;
        assert_eq!(result.html, "<h1>Hello</h1><p>Mundo</p>");
        assert_eq!(result.outcome, Outcome::Personalized { changed: 1, total: 2 });
    }

    #[tokio::test]
    async fn test_without_provider_fills_placeholders() {
        let fields = ClientFields {
            name: Some("Ana".to_string()),
            ..Default::default()
        };
        let result = personalize(
            None,
            "<h1>Hola {{cliente.nombre}}</h1><p>{{cliente.precio}}</p>",
            &request("Nombre: Ana", &fields, None),
        )
        .await;
        assert_eq!(result.html, "<h1>Hola Ana</h1><p></p>");
        assert!(matches!(result.outcome, Outcome::Fallback { .. }));
    }

    #[tokio::test]
    async fn test_provider_failure_fills_placeholders() {
        let provider = MockLlmProvider::with_failure();
        let fields = ClientFields::default();
        let result = personalize(
            Some(&provider),
            "<h1>Propuesta para {{cliente.nombre}}</h1>",
            &request("x", &fields, None),
        )
        .await;
        assert_eq!(result.html, "<h1>Propuesta para Cliente</h1>");
        match result.outcome {
            Outcome::Fallback { reason } => assert!(reason.contains("configured to fail")),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_text_nodes_returns_template_without_calling_llm() {
        let provider = MockLlmProvider::with_default("1. [h1] Hola");
        let fields = ClientFields::default();
        let template = "<div><span>nothing</span></div>";
        let result = personalize(Some(&provider), template, &request("x", &fields, None)).await;
        assert_eq!(result.html, template);
        assert_eq!(result.outcome, Outcome::NoTextNodes);
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_logo_is_injected_on_every_branch() {
        let logo = "https://cdn.example.com/logo.png";
        let template = r#"<img id="logo-img" src="" style="display: none"><h1>Hello</h1>"#;
        let fields = ClientFields::default();
        let ok = MockLlmProvider::with_default("1. [h1] Hola");
        let failing = MockLlmProvider::with_failure();

        for provider in [Some(&ok as &dyn LlmProvider), Some(&failing as &dyn LlmProvider), None] {
            let result = personalize(provider, template, &request("x", &fields, Some(logo))).await;
            assert!(result.html.contains(r#"src="https://cdn.example.com/logo.png""#));
            assert!(result.html.contains("display: block"));
        }

        let no_text = r#"<img id="logo-img" src="">"#;
        let result = personalize(Some(&ok), no_text, &request("x", &fields, Some(logo))).await;
        assert_eq!(result.outcome, Outcome::NoTextNodes);
        assert!(result.html.contains(logo));
    }
}
