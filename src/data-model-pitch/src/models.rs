use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use core_pitch::ClientFields;
use core_pitch::storage::{MirrorStatus, StorageError};

/// One personalization request and where its page lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    pub id: Uuid,
    pub prompt: String,
    /// Derived from `prompt`, never edited on its own.
    pub fields: ClientFields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Site-relative page URL, `/client/<id>`.
    pub url: String,
}

impl ClientRecord {
    pub fn new(prompt: &str, logo_url: Option<String>) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            prompt: prompt.to_string(),
            fields: core_pitch::extract_fields(prompt),
            logo_url,
            created_at: Utc::now(),
            url: client_url_path(&id),
        }
    }

    /// Storage path of the generated page.
    pub fn page_path(&self) -> String {
        page_path(&self.id)
    }

    pub fn to_snapshot(&self) -> SnapshotEntry {
        SnapshotEntry {
            id: self.id,
            prompt: self.prompt.clone(),
            created_at: self.created_at,
            url: self.url.clone(),
        }
    }

    /// Rebuilds a record from its snapshot. Fields are re-derived from the prompt; the logo is
    /// not part of the snapshot.
    pub fn from_snapshot(entry: SnapshotEntry) -> Self {
        Self {
            fields: core_pitch::extract_fields(&entry.prompt),
            id: entry.id,
            prompt: entry.prompt,
            logo_url: None,
            created_at: entry.created_at,
            url: entry.url,
        }
    }
}

pub fn client_url_path(id: &Uuid) -> String {
    format!("/client/{}", id)
}

pub fn page_path(id: &Uuid) -> String {
    format!("clients/{}.html", id)
}

/// The on-disk form of a client record in `clients.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub id: Uuid,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
    pub url: String,
}

/// Admin API access token a Shopify app handed over for a shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopifyToken {
    pub shop: String,
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ShopifyToken {
    /// Same token with all but its first and last four characters hidden.
    pub fn masked(&self) -> TokenListItem {
        TokenListItem {
            shop: self.shop.clone(),
            access_token: mask_token(&self.access_token),
            scope: self.scope.clone(),
            created_at: self.created_at,
        }
    }
}

fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

// API Payload Types

/// Input payload for POST /api/create-client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientPayload {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub shop: Option<String>,
}

/// Output payload for POST /api/create-client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientResponse {
    pub success: bool,
    pub client_id: Uuid,
    /// Absolute, shareable page URL.
    pub url: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

pub const CLIENT_CREATED_MESSAGE: &str = "Cliente creado exitosamente";

/// Output payload for the upload endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
    pub filename: String,
}

/// Input payload for POST /api/shopify/token
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPayload {
    #[serde(default)]
    pub shop: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSaved {
    pub success: bool,
    pub message: String,
}

/// A stored token as listed by GET /api/shopify/tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenListItem {
    pub shop: String,
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Output payload for GET /api/client/{id}/mirror
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorStatusResponse {
    pub client_id: Uuid,
    pub path: String,
    pub mirror_enabled: bool,
    /// None when this process never mirrored the page.
    pub status: Option<MirrorStatus>,
}

// API Error Types

pub const CLIENT_NOT_FOUND: &str = "Cliente no encontrado";
pub const PROMPT_REQUIRED: &str = "El prompt es requerido";

/// Error for POST /api/create-client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateClientError {
    /// Missing or whitespace-only prompt
    PromptRequired,
    Unknown(String),
}

/// Error for GET /api/client/{id} and GET /api/client/{id}/mirror
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetClientError {
    NotFound,
    Unknown(String),
}

/// Error for GET /client/{id}, which answers in plain text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientPageError {
    NotFound,
    Unknown(String),
}

/// Error for the upload endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// No file under the expected multipart field
    MissingFile,
    /// MIME type or extension outside the allow-list
    DisallowedType(String),
    TooLarge,
    Unknown(String),
}

/// Error for the Shopify token endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    MissingFields,
    InvalidShop(String),
    NotFound,
    Unknown(String),
}

/// Catch-all for handlers without their own error type.
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": self.0.to_string()
            })),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

macro_rules! from_error {
    ($lib_err:path, $err_type:tt) => {
        /// Converts a `$lib_err` into an `$err_type::Unknown`.
        impl From<$lib_err> for $err_type {
            fn from(e: $lib_err) -> Self {
                $err_type::Unknown(e.to_string())
            }
        }
    };
}

fn failure(status: StatusCode, error: &str) -> axum::response::Response {
    (status, Json(json!({ "success": false, "error": error }))).into_response()
}

// CreateClientError

impl IntoResponse for CreateClientError {
    fn into_response(self) -> axum::response::Response {
        match self {
            CreateClientError::PromptRequired => failure(StatusCode::BAD_REQUEST, PROMPT_REQUIRED),
            CreateClientError::Unknown(e) => failure(StatusCode::INTERNAL_SERVER_ERROR, &e),
        }
    }
}

from_error!(StorageError, CreateClientError);
from_error!(std::io::Error, CreateClientError);

// GetClientError

impl IntoResponse for GetClientError {
    fn into_response(self) -> axum::response::Response {
        match self {
            GetClientError::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": CLIENT_NOT_FOUND }))).into_response()
            }
            GetClientError::Unknown(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e }))).into_response()
            }
        }
    }
}

// ClientPageError

impl IntoResponse for ClientPageError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ClientPageError::NotFound => (StatusCode::NOT_FOUND, CLIENT_NOT_FOUND).into_response(),
            ClientPageError::Unknown(e) => {
                tracing::error!("Error serving client page: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Error al cargar la página").into_response()
            }
        }
    }
}

from_error!(StorageError, ClientPageError);

// UploadError

impl IntoResponse for UploadError {
    fn into_response(self) -> axum::response::Response {
        match self {
            UploadError::MissingFile => failure(StatusCode::BAD_REQUEST, "No se recibió ningún archivo"),
            UploadError::DisallowedType(t) => failure(
                StatusCode::BAD_REQUEST,
                &format!("Tipo de archivo no permitido: {}", t),
            ),
            UploadError::TooLarge => failure(StatusCode::PAYLOAD_TOO_LARGE, "El archivo supera el límite de 5MB"),
            UploadError::Unknown(e) => failure(StatusCode::INTERNAL_SERVER_ERROR, &e),
        }
    }
}

from_error!(StorageError, UploadError);

// TokenError

impl IntoResponse for TokenError {
    fn into_response(self) -> axum::response::Response {
        match self {
            TokenError::MissingFields => failure(StatusCode::BAD_REQUEST, "shop y accessToken son requeridos"),
            TokenError::InvalidShop(shop) => failure(
                StatusCode::BAD_REQUEST,
                &format!("Tienda no válida: {}", shop),
            ),
            TokenError::NotFound => failure(StatusCode::NOT_FOUND, "Token no encontrado"),
            TokenError::Unknown(e) => failure(StatusCode::INTERNAL_SERVER_ERROR, &e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_json_is_camel_case() {
        let mut record = ClientRecord::new("Nombre: Ana\nEmpresa: Acme", Some("https://x.test/l.png".to_string()));
        record.created_at = "2025-01-02T03:04:05Z".parse().unwrap();
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["url"], format!("/client/{}", record.id));
        assert_eq!(value["logoUrl"], "https://x.test/l.png");
        assert_eq!(value["createdAt"], "2025-01-02T03:04:05Z");
        assert_eq!(value["fields"]["name"], "Ana");
        assert_eq!(value["fields"]["company"], "Acme");
    }

    #[test]
    fn test_snapshot_round_trip_drops_logo_and_rederives_fields() {
        let record = ClientRecord::new("Empresa: Acme", Some("https://x.test/l.png".to_string()));
        let entry = record.to_snapshot();

        let json = serde_json::to_value(&entry).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 4);
        assert!(keys.contains(&"createdAt"));

        let restored = ClientRecord::from_snapshot(entry);
        assert_eq!(restored.id, record.id);
        assert_eq!(restored.fields, record.fields);
        assert_eq!(restored.logo_url, None);
    }

    #[test]
    fn test_page_path() {
        let record = ClientRecord::new("x", None);
        assert_eq!(record.page_path(), format!("clients/{}.html", record.id));
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("shpat_1234567890abcd"), "shpa…abcd");
        assert_eq!(mask_token("short"), "*****");
    }

    #[test]
    fn test_create_payload_accepts_missing_fields() {
        let payload: CreateClientPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.prompt.is_none());
        let payload: CreateClientPayload =
            serde_json::from_str(r#"{"prompt":"hola","logoUrl":"gid://shopify/MediaImage/1","shop":"a.myshopify.com"}"#)
                .unwrap();
        assert_eq!(payload.logo_url.as_deref(), Some("gid://shopify/MediaImage/1"));
        assert_eq!(payload.shop.as_deref(), Some("a.myshopify.com"));
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(
            CreateClientError::PromptRequired.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(GetClientError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(ClientPageError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(UploadError::TooLarge.into_response().status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            UploadError::DisallowedType("text/plain".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(TokenError::MissingFields.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            CreateClientError::from(std::io::Error::other("disk full")),
            CreateClientError::Unknown("disk full".to_string())
        );
    }
}
