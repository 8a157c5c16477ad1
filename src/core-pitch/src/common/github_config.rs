use std::env;

use crate::common::env::env_or;

/// Where pages and uploads get mirrored when GitHub storage is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubConfig {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl GitHubConfig {
    /// Splits an `owner/repo` string. None unless both halves are non-empty.
    pub fn parse_repo(owner_repo: &str) -> Option<(String, String)> {
        let (owner, repo) = owner_repo.trim().split_once('/')?;
        let (owner, repo) = (owner.trim(), repo.trim().trim_end_matches(".git"));
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some((owner.to_string(), repo.to_string()))
    }
}

pub const DEFAULT_GITHUB_BRANCH: &str = "main";

/// Get the GitHub mirror configuration.
/// Returns None unless GITHUB_TOKEN and GITHUB_REPO (`owner/repo`) are both set.
/// GITHUB_BRANCH defaults to `main`.
pub fn get_github_config() -> Option<GitHubConfig> {
    GitHubConfig::from_vars(
        env::var("GITHUB_TOKEN").ok().as_deref(),
        env::var("GITHUB_REPO").ok().as_deref(),
        &env_or("GITHUB_BRANCH", DEFAULT_GITHUB_BRANCH),
    )
}

impl GitHubConfig {
    /// Builds the config from raw variable values. A blank token or a malformed repo disables it.
    pub fn from_vars(token: Option<&str>, owner_repo: Option<&str>, branch: &str) -> Option<Self> {
        let token = token.map(str::trim).filter(|t| !t.is_empty())?;
        let owner_repo = owner_repo?;
        let Some((owner, repo)) = Self::parse_repo(owner_repo) else {
            tracing::warn!("GITHUB_REPO must look like 'owner/repo', got '{}'. GitHub mirror disabled.", owner_repo);
            return None;
        };
        Some(GitHubConfig {
            token: token.to_string(),
            owner,
            repo,
            branch: branch.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo() {
        assert_eq!(
            GitHubConfig::parse_repo("acme/pages"),
            Some(("acme".to_string(), "pages".to_string()))
        );
        assert_eq!(
            GitHubConfig::parse_repo(" acme/pages.git "),
            Some(("acme".to_string(), "pages".to_string()))
        );
        assert_eq!(GitHubConfig::parse_repo("acme"), None);
        assert_eq!(GitHubConfig::parse_repo("acme/"), None);
        assert_eq!(GitHubConfig::parse_repo("a/b/c"), None);
    }

    #[test]
    fn test_from_vars_needs_token_and_repo_only() {
        let config = GitHubConfig::from_vars(Some(" ghp_x "), Some("acme/pages"), DEFAULT_GITHUB_BRANCH).unwrap();
        assert_eq!(config.token, "ghp_x");
        assert_eq!((config.owner.as_str(), config.repo.as_str()), ("acme", "pages"));
        assert_eq!(config.branch, "main");

        assert_eq!(GitHubConfig::from_vars(None, Some("acme/pages"), "main"), None);
        assert_eq!(GitHubConfig::from_vars(Some("  "), Some("acme/pages"), "main"), None);
        assert_eq!(GitHubConfig::from_vars(Some("ghp_x"), None, "main"), None);
        assert_eq!(GitHubConfig::from_vars(Some("ghp_x"), Some("acme"), "main"), None);
    }
}
