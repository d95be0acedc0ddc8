use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::llm::prompts::sanitize_for_prompt;
use crate::models::{ChatMessage, ChatRequest, ChatResponse};
use crate::state::AppState;

const MAX_MESSAGES: usize = 50;
const MAX_MESSAGE_LEN: usize = 20_000;
const ALLOWED_ROLES: [&str; 3] = ["system", "user", "assistant"];

/// POST /api/chat - Forward role-tagged messages to the chat provider.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<Value>)> {
    let messages = validate_messages(req.messages).map_err(|msg| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid request", "details": msg })),
        )
    })?;

    let messages: Vec<ChatMessage> = messages
        .into_iter()
        .map(|m| match m.role.as_str() {
            "system" => m,
            _ => ChatMessage {
                content: sanitize_for_prompt(&m.content),
                role: m.role,
            },
        })
        .collect();

    match state.chat.complete(&messages).await {
        Ok(message) => Ok(Json(ChatResponse { message })),
        Err(e) => {
            tracing::error!("Chat completion failed: {e:#}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed request", "details": format!("{e:#}") })),
            ))
        }
    }
}

fn validate_messages(messages: Vec<ChatMessage>) -> Result<Vec<ChatMessage>, String> {
    if messages.is_empty() {
        return Err("At least one message is required".to_string());
    }
    if messages.len() > MAX_MESSAGES {
        return Err(format!("At most {MAX_MESSAGES} messages are allowed"));
    }
    for m in &messages {
        if !ALLOWED_ROLES.contains(&m.role.as_str()) {
            return Err(format!("Unsupported role: {}", m.role));
        }
        if m.content.len() > MAX_MESSAGE_LEN {
            return Err(format!("Message exceeds {MAX_MESSAGE_LEN} bytes"));
        }
    }
    Ok(messages)
}
