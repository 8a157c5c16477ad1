use axum::{
    extract::{Json, Path, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse},
};
use uuid::Uuid;

use core_pitch::storage::{PageStore, content_type_for};
use core_pitch::{Outcome, PersonalizeRequest, personalize};
use data_model_pitch::models::{
    AppError, CLIENT_CREATED_MESSAGE, ClientPageError, ClientRecord, CreateClientError, CreateClientPayload,
    CreateClientResponse, GetClientError, MirrorStatusResponse, page_path,
};

use crate::state::AppState;

const PROMPT_LOG_CHARS: usize = 200;

/// Runs the pipeline for `record` and stores the page. Returns the page and how it was made.
async fn render_page(state: &AppState, record: &ClientRecord) -> Result<(String, Outcome), CreateClientError> {
    let template = state.read_template().await?;
    let request = PersonalizeRequest {
        prompt: &record.prompt,
        fields: &record.fields,
        logo_url: record.logo_url.as_deref(),
    };
    let result = personalize(state.provider.as_deref(), &template, &request).await;

    let (_, mirror) = state
        .pages
        .write_through(&record.page_path(), result.html.clone().into_bytes(), content_type_for("html"))
        .await?;
    if mirror.is_some() {
        tracing::debug!("Mirroring {} in the background", record.page_path());
    }
    Ok((result.html, result.outcome))
}

fn prompt_preview(prompt: &str) -> String {
    let mut preview: String = prompt.chars().take(PROMPT_LOG_CHARS).collect();
    if prompt.chars().count() > PROMPT_LOG_CHARS {
        preview.push_str("...");
    }
    preview
}

/// POST /api/create-client - Personalize the template for a new client
pub async fn post_create_client(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateClientPayload>,
) -> Result<impl IntoResponse, CreateClientError> {
    let prompt = payload
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or(CreateClientError::PromptRequired)?;

    let logo_url = state
        .resolve_logo_url(payload.logo_url.as_deref(), prompt, payload.shop.as_deref())
        .await;
    let record = ClientRecord::new(prompt, logo_url);

    let (_, outcome) = render_page(&state, &record).await?;
    state.clients.insert(record.clone()).await;

    let url = state.absolute_url(&headers, &record.url);
    tracing::info!(
        client_id = %record.id,
        url = %url,
        outcome = ?outcome,
        "Client created. Prompt: {}",
        prompt_preview(prompt)
    );

    Ok((
        StatusCode::OK,
        Json(CreateClientResponse {
            success: true,
            client_id: record.id,
            url,
            message: CLIENT_CREATED_MESSAGE.to_string(),
            created_at: record.created_at,
        }),
    ))
}

/// GET /client/{client_id} - The client's page, regenerated if it is not stored
pub async fn get_client_page(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> Result<Html<String>, ClientPageError> {
    let id: Uuid = client_id.parse().map_err(|_| ClientPageError::NotFound)?;
    let record = state.clients.get(&id).await.ok_or(ClientPageError::NotFound)?;

    if let Some(bytes) = state.pages.get(&record.page_path()).await? {
        return Ok(Html(String::from_utf8_lossy(&bytes).into_owned()));
    }

    tracing::info!("No stored page for client {}, regenerating", id);
    let (html, _) = render_page(&state, &record)
        .await
        .map_err(|e| ClientPageError::Unknown(format!("{:?}", e)))?;
    Ok(Html(html))
}

/// GET /api/client/{client_id} - The client's record
pub async fn get_client(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> Result<Json<ClientRecord>, GetClientError> {
    let id: Uuid = client_id.parse().map_err(|_| GetClientError::NotFound)?;
    state
        .clients
        .get(&id)
        .await
        .map(Json)
        .ok_or(GetClientError::NotFound)
}

/// GET /api/clients - Every client, newest first
pub async fn get_clients(State(state): State<AppState>) -> Json<Vec<ClientRecord>> {
    Json(state.clients.list().await)
}

/// GET /api/client/{client_id}/mirror - Where the background copy of the page stands
pub async fn get_mirror_status(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> Result<Json<MirrorStatusResponse>, GetClientError> {
    let id: Uuid = client_id.parse().map_err(|_| GetClientError::NotFound)?;
    if state.clients.get(&id).await.is_none() {
        return Err(GetClientError::NotFound);
    }

    let path = page_path(&id);
    Ok(Json(MirrorStatusResponse {
        client_id: id,
        mirror_enabled: state.pages.has_mirror(),
        status: state.pages.mirror_status(&path).await,
        path,
    }))
}

/// GET / - The unpersonalized template
pub async fn get_template(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    Ok(Html(state.read_template().await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_preview() {
        assert_eq!(prompt_preview("corto"), "corto");
        let long = "ñ".repeat(250);
        let preview = prompt_preview(&long);
        assert_eq!(preview.chars().count(), 203);
        assert!(preview.ends_with("..."));
    }
}
