use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

use super::{PageStore, StorageError, StoredObject, validate_path};
use crate::common::GitHubConfig;

const GITHUB_API: &str = "https://api.github.com";

/// Files committed to a GitHub repository through the contents API.
pub struct GitHubStore {
    client: reqwest::Client,
    config: GitHubConfig,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct ContentsEntry {
    sha: String,
    #[serde(default)]
    content: Option<String>,
}

impl GitHubStore {
    pub fn new(client: reqwest::Client, config: GitHubConfig) -> Self {
        Self {
            client,
            config,
            api_base: GITHUB_API.to_string(),
        }
    }

    /// Talks to a different API host, e.g. GitHub Enterprise.
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, self.config.owner, self.config.repo, path
        )
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.config.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "pitch-pages")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    /// The existing file on the configured branch, if any.
    async fn fetch(&self, path: &str) -> Result<Option<ContentsEntry>, StorageError> {
        let url = Url::parse_with_params(&self.contents_url(path), [("ref", self.config.branch.as_str())])
            .map_err(|e| StorageError::GitHub(format!("invalid contents URL: {}", e)))?;
        let response = self.request(reqwest::Method::GET, url.as_str()).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(api_error(status, response).await),
        }
    }

    fn put_body(&self, path: &str, bytes: &[u8], sha: Option<&str>) -> Value {
        let mut body = json!({
            "message": format!("Update {}", path),
            "content": STANDARD.encode(bytes),
            "branch": self.config.branch,
        });
        if let Some(sha) = sha {
            body["sha"] = Value::String(sha.to_string());
        }
        body
    }
}

async fn api_error(status: StatusCode, response: reqwest::Response) -> StorageError {
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v["message"].as_str().map(str::to_string))
        .unwrap_or(text);
    StorageError::GitHub(format!("{}: {}", status, message))
}

/// The contents API wraps base64 at 60 columns.
fn decode_content(content: &str) -> Result<Vec<u8>, StorageError> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| StorageError::GitHub(format!("invalid base64 content: {}", e)))
}

#[async_trait]
impl PageStore for GitHubStore {
    async fn put(&self, path: &str, bytes: &[u8], _content_type: &str) -> Result<StoredObject, StorageError> {
        validate_path(path)?;
        let existing = self.fetch(path).await?;
        let body = self.put_body(path, bytes, existing.as_ref().map(|e| e.sha.as_str()));

        let response = self
            .request(reqwest::Method::PUT, &self.contents_url(path))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }

        tracing::debug!(
            "Committed {} to {}/{}@{}",
            path,
            self.config.owner,
            self.config.repo,
            self.config.branch
        );
        Ok(StoredObject {
            path: path.to_string(),
            url: self.public_url(path),
        })
    }

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError> {
        validate_path(path)?;
        match self.fetch(path).await? {
            Some(ContentsEntry {
                content: Some(content),
                ..
            }) => Ok(Some(decode_content(&content)?)),
            Some(_) => Err(StorageError::GitHub(format!("'{}' is not a file", path))),
            None => Ok(None),
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "https://raw.githubusercontent.com/{}/{}/{}/{}",
            self.config.owner, self.config.repo, self.config.branch, path
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> GitHubStore {
        GitHubStore::new(
            reqwest::Client::new(),
            GitHubConfig {
                token: "ghp_test".to_string(),
                owner: "acme".to_string(),
                repo: "pages".to_string(),
                branch: "main".to_string(),
            },
        )
    }

    #[test]
    fn test_urls() {
        let store = store();
        assert_eq!(
            store.contents_url("clients/a.html"),
            "https://api.github.com/repos/acme/pages/contents/clients/a.html"
        );
        assert_eq!(
            store.public_url("clients/a.html"),
            "https://raw.githubusercontent.com/acme/pages/main/clients/a.html"
        );
        assert_eq!(
            store.with_api_base("https://ghe.local/api/v3/").contents_url("x.png"),
            "https://ghe.local/api/v3/repos/acme/pages/contents/x.png"
        );
    }

    #[test]
    fn test_put_body_for_new_file() {
        let body = store().put_body("clients/a.html", b"<h1>Hola</h1>", None);
        assert_eq!(body["content"], "PGgxPkhvbGE8L2gxPg==");
        assert_eq!(body["branch"], "main");
        assert_eq!(body["message"], "Update clients/a.html");
        assert!(body.get("sha").is_none());
    }

    #[test]
    fn test_put_body_for_existing_file_carries_sha() {
        let body = store().put_body("clients/a.html", b"x", Some("abc123"));
        assert_eq!(body["sha"], "abc123");
    }

    #[test]
    fn test_decode_wrapped_content() {
        assert_eq!(decode_content("PGgxPkhv\nbGE8L2gx\nPg==\n").unwrap(), b"<h1>Hola</h1>".to_vec());
        assert!(decode_content("not base64!").is_err());
    }
}
