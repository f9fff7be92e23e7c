use actix_web::http::{header, StatusCode};
use actix_web::{post, web, HttpRequest, HttpResponse};
use log::{info, warn};

use crate::errors::ServerError;
use crate::server::AppState;
use ragproxy_core::errors::RagError;
use ragproxy_core::types::ChatCompletionRequest;
use ragproxy_core::usage::UsageTap;

// partitions the prompt cache; requests without it share one namespace
pub const CONVERSATION_HEADER: &str = "X-Conversation-Id";

#[post("/v1/chat/completions")]
pub async fn completions(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServerError> {
    info!("received chat completion request");
    authorize(&req, &state.api_key)?;

    let request: ChatCompletionRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!("failed to parse request body: {}", e);
        ServerError::BadRequest("failed to read request body".to_string())
    })?;
    if request.messages.is_empty() {
        return Err(ServerError::BadRequest(
            RagError::EmptyConversation.to_string(),
        ));
    }

    let conversation = conversation_id(&req);
    let request = state
        .augmenter
        .augment(request, conversation.as_deref())
        .await
        .map_err(|e| match e {
            RagError::Template(_) | RagError::Render(_) => {
                ServerError::internal("failed to execute template", e)
            }
            RagError::EmptyConversation => ServerError::BadRequest(e.to_string()),
            _ => ServerError::internal("failed to retrieve context", e),
        })?;

    let upstream = state
        .upstream
        .chat_completion(&request)
        .await
        .map_err(|e| ServerError::internal("failed to contact upstream API", e))?;
    info!("response status code: {}", upstream.status);

    let status = StatusCode::from_u16(upstream.status)
        .map_err(|e| ServerError::internal("invalid upstream status code", e))?;
    let content_type = upstream
        .content_type
        .unwrap_or_else(|| "application/json".to_string());
    Ok(HttpResponse::build(status)
        .content_type(content_type)
        .streaming(UsageTap::new(upstream.body)))
}

fn authorize(req: &HttpRequest, api_key: &str) -> Result<(), ServerError> {
    let expected = format!("Bearer {api_key}");
    match req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        Some(actual) if actual == expected => Ok(()),
        _ => Err(ServerError::Unauthorized),
    }
}

fn conversation_id(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(CONVERSATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
