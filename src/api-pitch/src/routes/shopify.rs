use axum::extract::{Json, Path, State};

use core_pitch::shopify::normalize_shop;
use data_model_pitch::models::{ShopifyToken, TokenError, TokenListItem, TokenPayload, TokenSaved};

use crate::state::AppState;

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// POST /api/shopify/token - Store the access token a Shopify app obtained for its shop
pub async fn post_token(
    State(state): State<AppState>,
    Json(payload): Json<TokenPayload>,
) -> Result<Json<TokenSaved>, TokenError> {
    let (Some(shop), Some(access_token)) = (non_blank(&payload.shop), non_blank(&payload.access_token)) else {
        return Err(TokenError::MissingFields);
    };
    let shop = normalize_shop(shop).ok_or_else(|| TokenError::InvalidShop(shop.to_string()))?;

    state
        .tokens
        .save(&shop, access_token, non_blank(&payload.scope).map(str::to_string))
        .await;

    Ok(Json(TokenSaved {
        success: true,
        message: format!("Token guardado para {}", shop),
    }))
}

/// GET /api/shopify/token/{shop} - The token stored for a shop
pub async fn get_token(
    State(state): State<AppState>,
    Path(shop): Path<String>,
) -> Result<Json<ShopifyToken>, TokenError> {
    let shop = normalize_shop(&shop).ok_or(TokenError::InvalidShop(shop))?;
    state.tokens.get(&shop).await.map(Json).ok_or(TokenError::NotFound)
}

/// GET /api/shopify/tokens - Every stored token, masked
pub async fn get_tokens(State(state): State<AppState>) -> Json<Vec<TokenListItem>> {
    Json(state.tokens.list().await.iter().map(ShopifyToken::masked).collect())
}
