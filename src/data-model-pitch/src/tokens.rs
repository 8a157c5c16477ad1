//! Shopify access tokens relayed by the Shopify app, kept in memory.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::models::ShopifyToken;

#[derive(Default)]
pub struct TokenStore {
    tokens: RwLock<HashMap<String, ShopifyToken>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the token for `shop`, replacing any earlier one.
    pub async fn save(&self, shop: &str, access_token: &str, scope: Option<String>) -> ShopifyToken {
        let token = ShopifyToken {
            shop: shop.to_string(),
            access_token: access_token.to_string(),
            scope,
            created_at: Utc::now(),
        };
        self.tokens
            .write()
            .await
            .insert(shop.to_string(), token.clone());
        tracing::info!("Stored Shopify token for {}", shop);
        token
    }

    pub async fn get(&self, shop: &str) -> Option<ShopifyToken> {
        self.tokens.read().await.get(shop).cloned()
    }

    /// Every token, most recent first.
    pub async fn list(&self) -> Vec<ShopifyToken> {
        let mut tokens: Vec<ShopifyToken> = self.tokens.read().await.values().cloned().collect();
        tokens.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tokens
    }

    /// The most recently stored token, for requests that don't name a shop.
    pub async fn any(&self) -> Option<ShopifyToken> {
        self.tokens
            .read()
            .await
            .values()
            .max_by_key(|t| t.created_at)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_get() {
        let store = TokenStore::new();
        store
            .save("acme.myshopify.com", "shpat_one", Some("read_files".to_string()))
            .await;
        let token = store.get("acme.myshopify.com").await.unwrap();
        assert_eq!(token.access_token, "shpat_one");
        assert_eq!(token.scope.as_deref(), Some("read_files"));
        assert!(store.get("other.myshopify.com").await.is_none());
    }

    #[tokio::test]
    async fn test_save_replaces() {
        let store = TokenStore::new();
        store.save("acme.myshopify.com", "shpat_one", None).await;
        store.save("acme.myshopify.com", "shpat_two", None).await;
        assert_eq!(store.list().await.len(), 1);
        assert_eq!(
            store.get("acme.myshopify.com").await.unwrap().access_token,
            "shpat_two"
        );
    }

    #[tokio::test]
    async fn test_any_is_most_recent() {
        let store = TokenStore::new();
        assert!(store.any().await.is_none());
        store.save("a.myshopify.com", "shpat_a", None).await;
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        store.save("b.myshopify.com", "shpat_b", None).await;
        assert_eq!(store.any().await.unwrap().shop, "b.myshopify.com");
        assert_eq!(store.list().await[0].shop, "b.myshopify.com");
    }
}
