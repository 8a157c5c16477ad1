//! Resolving Shopify media ids to image URLs through the Admin GraphQL API.

use serde_json::{Value, json};

use crate::Error;

const ADMIN_API_VERSION: &str = "2024-10";

const MEDIA_URL_QUERY: &str = "query MediaUrl($id: ID!) { \
    node(id: $id) { \
        ... on MediaImage { image { url } } \
        ... on GenericFile { url } \
    } \
}";

/// Lowercases a shop reference and strips scheme and trailing slashes.
/// None unless the result looks like `<name>.myshopify.com`.
pub fn normalize_shop(shop: &str) -> Option<String> {
    let shop = shop.trim().to_ascii_lowercase();
    let shop = shop
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');
    let name = shop.strip_suffix(".myshopify.com")?;
    let valid = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        && !name.starts_with('-');
    valid.then(|| shop.to_string())
}

/// Looks up the image URL behind a `gid://shopify/...` id.
///
/// `Ok(None)` when the id exists but is not an image, or does not exist at all.
pub async fn resolve_gid(client: &reqwest::Client, shop: &str, access_token: &str, gid: &str) -> Result<Option<String>, Error> {
    let shop = normalize_shop(shop).ok_or_else(|| Error::ShopifyError(format!("'{}' is not a myshopify.com domain", shop)))?;
    let endpoint = format!("https://{}/admin/api/{}/graphql.json", shop, ADMIN_API_VERSION);

    tracing::debug!("Resolving {} on {}", gid, shop);
    let response = client
        .post(&endpoint)
        .header("X-Shopify-Access-Token", access_token)
        .json(&json!({ "query": MEDIA_URL_QUERY, "variables": { "id": gid } }))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::ShopifyError(format!("{} returned {}: {}", endpoint, status, body)));
    }

    let body: Value = response.json().await?;
    url_from_gid_response(&body)
}

/// Pulls the image URL out of a GraphQL `node` response.
pub fn url_from_gid_response(body: &Value) -> Result<Option<String>, Error> {
    if let Some(errors) = body.get("errors").and_then(Value::as_array)
        && !errors.is_empty()
    {
        let messages: Vec<&str> = errors
            .iter()
            .filter_map(|e| e.get("message").and_then(Value::as_str))
            .collect();
        return Err(Error::ShopifyError(messages.join("; ")));
    }

    let node = &body["data"]["node"];
    let url = node["image"]["url"]
        .as_str()
        .or_else(|| node["url"].as_str())
        .filter(|url| !url.is_empty());
    Ok(url.map(str::to_string))
}
