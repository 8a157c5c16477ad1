use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{HeaderMap, header};

use core_pitch::llms::{ChatGpt, LlmProvider};
use core_pitch::shopify::{normalize_shop, resolve_gid};
use core_pitch::storage::{GitHubStore, LocalDiskStore, MirroredStore, PageStore};
use core_pitch::{AppConfig, LogoSource, classify_logo};
use data_model_pitch::{ClientStore, TokenStore};

/// Everything the handlers share, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub clients: Arc<ClientStore>,
    pub tokens: Arc<TokenStore>,
    pub pages: MirroredStore,
    pub provider: Option<Arc<dyn LlmProvider>>,
    pub template_path: PathBuf,
    pub public_base_url: Option<String>,
    pub http: reqwest::Client,
}

impl AppState {
    /// Wires up the stores described by `config`. Uses ChatGPT when an API key is configured.
    pub fn from_config(config: &AppConfig) -> Self {
        let provider = config
            .openai_api_key
            .as_deref()
            .map(|key| Arc::new(ChatGpt::new(key, &config.openai_model)) as Arc<dyn LlmProvider>);
        Self::with_provider(config, provider)
    }

    pub fn with_provider(config: &AppConfig, provider: Option<Arc<dyn LlmProvider>>) -> Self {
        let http = reqwest::Client::new();

        let primary: Arc<dyn PageStore> = Arc::new(LocalDiskStore::new(&config.public_dir, ""));
        let mirror = config.github.clone().map(|github| {
            tracing::info!(
                "Mirroring pages to GitHub {}/{}@{}",
                github.owner,
                github.repo,
                github.branch
            );
            Arc::new(GitHubStore::new(http.clone(), github)) as Arc<dyn PageStore>
        });

        match &provider {
            Some(_) => tracing::info!("LLM personalization enabled ({})", config.openai_model),
            None => tracing::warn!("OPENAI_API_KEY not set: pages will only get placeholder substitution"),
        }

        Self {
            clients: Arc::new(ClientStore::new(Some(config.snapshot_path()))),
            tokens: Arc::new(TokenStore::new()),
            pages: MirroredStore::new(primary, mirror),
            provider,
            template_path: config.template_path.clone(),
            public_base_url: config.public_base_url.clone(),
            http,
        }
    }

    pub async fn read_template(&self) -> std::io::Result<String> {
        tokio::fs::read_to_string(&self.template_path).await
    }

    /// Turns a site-relative path into the URL clients should share.
    ///
    /// PUBLIC_BASE_URL when set, otherwise the request's `Host` with the scheme from
    /// `X-Forwarded-Proto` (default `http`).
    pub fn absolute_url(&self, headers: &HeaderMap, path: &str) -> String {
        if let Some(base) = &self.public_base_url {
            return format!("{}{}", base, path);
        }
        let Some(host) = headers.get(header::HOST).and_then(|h| h.to_str().ok()) else {
            return path.to_string();
        };
        let proto = headers
            .get("x-forwarded-proto")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.split(',').next())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or("http");
        format!("{}://{}{}", proto, host, path)
    }

    /// The logo URL for a new page, if any can be found.
    ///
    /// Shopify GIDs are resolved with the token stored for `shop`, or the most recent token
    /// when no shop is given. Resolution failures are logged and leave the page without a logo.
    pub async fn resolve_logo_url(&self, explicit: Option<&str>, prompt: &str, shop: Option<&str>) -> Option<String> {
        match classify_logo(explicit, prompt)? {
            LogoSource::Upload(url) | LogoSource::Prompt(url) => Some(url),
            LogoSource::ShopifyGid(gid) => {
                let token = match shop.and_then(normalize_shop) {
                    Some(shop) => self.tokens.get(&shop).await,
                    None => self.tokens.any().await,
                };
                let Some(token) = token else {
                    tracing::warn!("No Shopify token stored to resolve {}; no logo", gid);
                    return None;
                };
                match resolve_gid(&self.http, &token.shop, &token.access_token, &gid).await {
                    Ok(Some(url)) => Some(url),
                    Ok(None) => {
                        tracing::warn!("{} on {} is not an image; no logo", gid, token.shop);
                        None
                    }
                    Err(e) => {
                        tracing::warn!("Failed to resolve {} on {}: {}", gid, token.shop, e);
                        None
                    }
                }
            }
        }
    }
}
