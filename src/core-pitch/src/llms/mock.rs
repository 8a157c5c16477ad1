//! Mock LLM provider for testing
//!
//! This module provides a mock implementation of the `LlmProvider` trait
//! that can be configured to return predefined responses or errors,
//! without making real API calls.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::{
    Error,
    llms::{CompletionRequest, LlmProvider},
};

/// Mock LLM provider for testing
///
/// Can be configured to:
/// - Return specific responses based on user prompt content
/// - Return a default response for any prompt
/// - Simulate API failures
///
/// Every request it receives is recorded and can be inspected with `requests()`.
pub struct MockLlmProvider {
    /// (prompt substring, response) pairs, checked in insertion order
    responses: Vec<(String, String)>,
    /// Default response if no specific match found
    default_response: Option<String>,
    /// If true, always return an error
    should_fail: bool,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlmProvider {
    /// Create a new empty mock provider
    pub fn new() -> Self {
        Self {
            responses: Vec::new(),
            default_response: None,
            should_fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that returns a specific response when the prompt contains the given text
    pub fn with_response(prompt_contains: &str, response: &str) -> Self {
        let mut provider = Self::new();
        provider.add_response(prompt_contains, response);
        provider
    }

    /// Create a mock with a default response for any prompt
    pub fn with_default(response: &str) -> Self {
        let mut provider = Self::new();
        provider.set_default(response);
        provider
    }

    /// Create a mock that always fails with an error
    pub fn with_failure() -> Self {
        let mut provider = Self::new();
        provider.set_should_fail(true);
        provider
    }

    /// Add a response mapping to this provider
    pub fn add_response(&mut self, prompt_contains: &str, response: &str) {
        self.responses
            .push((prompt_contains.to_string(), response.to_string()));
    }

    /// Set the default response
    pub fn set_default(&mut self, response: &str) {
        self.default_response = Some(response.to_string());
    }

    /// Set whether this provider should fail
    pub fn set_should_fail(&mut self, should_fail: bool) {
        self.should_fail = should_fail;
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        match self.requests.lock() {
            Ok(requests) => requests.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Default for MockLlmProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, Error> {
        match self.requests.lock() {
            Ok(mut requests) => requests.push(request.clone()),
            Err(poisoned) => poisoned.into_inner().push(request.clone()),
        }

        if self.should_fail {
            return Err(Error::CompletionFailure(
                "Mock LLM provider configured to fail".to_string(),
            ));
        }

        for (key, response) in &self.responses {
            if request.user.contains(key.as_str()) {
                return Ok(response.clone());
            }
        }

        if let Some(default) = &self.default_response {
            return Ok(default.clone());
        }

        Err(Error::CompletionFailure(
            "Mock LLM provider has no response configured for this prompt".to_string(),
        ))
    }
}

//
// Test Fixtures
//

/// A small landing page in the shape of the production template.
pub fn sample_template() -> &'static str {
    r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="UTF-8">
    <title>Propuesta</title>
    <style>
        .hidden { display: none; }
    </style>
</head>
<body>
    <header>
        <img id="logo-img" src="" alt="Logo" style="display: none; height: 48px;">
        <h1>Propuesta para {{cliente.nombre}}</h1>
        <p>Una experiencia digital a medida.</p>
    </header>
    <section>
        <h2>Objetivos</h2>
        <ul>
            <li>Aumentar la captación de leads</li>
            <li>Mejorar la imagen de marca</li>
        </ul>
    </section>
    <section class="circuit">
        <div class="circuit-step">
            <h3 class="circuit-step-title">Descubrimiento</h3>
            <div class="circuit-step-description">Analizamos tu negocio.</div>
        </div>
    </section>
    <script>
        const car = document.getElementById("car");
        car.innerHTML = "<p>3D</p>";
    </script>
</body>
</html>
"#
}

/// A response that rewrites every text of `sample_template`, in protocol format.
pub fn sample_template_response() -> &'static str {
    "1. [h1] Propuesta para Acme Motors\n\
     2. [p] Una experiencia digital pensada para Acme.\n\
     3. [h2] Objetivos de Acme\n\
     4. [li] Duplicar los leads de concesionarios\n\
     5. [li] Reforzar la marca Acme\n\
     6. [h3] Descubrimiento con Acme\n\
     7. [circuit-step-title] Descubrimiento inicial\n\
     8. [circuit-step-description] Analizamos el negocio de Acme."
}
