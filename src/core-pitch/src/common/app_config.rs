use std::path::PathBuf;

use crate::common::env::{env_or, is_env_set};
use crate::common::github_config::{GitHubConfig, get_github_config};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Process-wide settings for the webserver, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// The HTML landing page every client page is personalized from.
    pub template_path: PathBuf,
    /// Root of the statically served directory (client pages and uploads live under it).
    pub public_dir: PathBuf,
    /// Directory holding the `clients.json` snapshot.
    pub data_dir: PathBuf,
    /// Overrides the scheme://host used in shareable URLs.
    pub public_base_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub github: Option<GitHubConfig>,
}

impl AppConfig {
    /// Reads TEMPLATE_PATH, PUBLIC_DIR, DATA_DIR, PUBLIC_BASE_URL, OPENAI_API_KEY, OPENAI_MODEL
    /// and the GitHub variables (see `get_github_config`).
    pub fn from_env() -> Self {
        let public_base_url = if is_env_set("PUBLIC_BASE_URL") {
            Some(env_or("PUBLIC_BASE_URL", "").trim_end_matches('/').to_string())
        } else {
            None
        };
        let openai_api_key = if is_env_set("OPENAI_API_KEY") {
            Some(env_or("OPENAI_API_KEY", ""))
        } else {
            None
        };
        Self {
            template_path: PathBuf::from(env_or("TEMPLATE_PATH", "index.html")),
            public_dir: PathBuf::from(env_or("PUBLIC_DIR", "public")),
            data_dir: PathBuf::from(env_or("DATA_DIR", "data")),
            public_base_url,
            openai_api_key,
            openai_model: env_or("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            github: get_github_config(),
        }
    }

    /// Location of the lossy client snapshot.
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("clients.json")
    }
}
