//! HTTP surface: the web chat adapter, the Telegram webhook adapter, and the
//! shared application state.

use std::sync::Arc;

use anyhow::Context as _;
use axum::extract::State;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use minijinja::{context, Environment};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::chat::{answer_with_memory, ChatMessage};
use crate::config::Config;
use crate::session::{chat_id_from_cookies, sign_chat_id, SESSION_COOKIE};
use crate::store::ConversationStore;
use crate::telegram::{send_telegram_message, TelegramUpdate};

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");

/// Shared state passed into every handler. Conversation stores are explicit
/// values here rather than process globals; the web and Telegram stores are
/// independent and share no identifier space.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http_client: Client,
    pub web_conversations: ConversationStore,
    pub telegram_conversations: ConversationStore,
    templates: Arc<Environment<'static>>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("research-chat/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build http client")?;
        let mut templates = Environment::new();
        templates
            .add_template("index.html", INDEX_TEMPLATE)
            .context("register index template")?;
        Ok(Self {
            config: Arc::new(config),
            http_client,
            web_conversations: ConversationStore::new(),
            telegram_conversations: ConversationStore::new(),
            templates: Arc::new(templates),
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/get_response", post(get_response))
        .route("/telegram_webhook", post(telegram_webhook))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Uncaught faults from handlers surface as a generic 500 JSON body; there
/// is no finer-grained error taxonomy in this service.
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let detail = format!("{:#}", self.0);
        tracing::error!(error = %detail, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": detail })),
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

async fn home(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    let cookie_header = headers.get(COOKIE).and_then(|value| value.to_str().ok());
    let existing = chat_id_from_cookies(&state.config.session_secret, cookie_header);
    let (chat_id, fresh) = match existing {
        Some(id) => {
            if !state.web_conversations.contains(&id) {
                tracing::debug!(chat_id = %id, "recreating conversation for returning session");
            }
            (id, false)
        }
        None => (Uuid::new_v4().to_string(), true),
    };
    state.web_conversations.ensure(&chat_id);

    let page = state
        .templates
        .get_template("index.html")
        .context("load index template")?
        .render(context! { active_chat => chat_id.clone() })
        .context("render index template")?;

    let mut response = Html(page).into_response();
    if fresh {
        let cookie = format!(
            "{SESSION_COOKIE}={}; Path=/; HttpOnly",
            sign_chat_id(&state.config.session_secret, &chat_id)
        );
        response.headers_mut().insert(
            SET_COOKIE,
            HeaderValue::from_str(&cookie).context("encode session cookie")?,
        );
        tracing::info!(chat_id = %chat_id, "started web conversation");
    }
    Ok(response)
}

#[derive(Debug, Deserialize)]
struct GetResponseRequest {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
struct GetResponseReply {
    bot: String,
}

async fn get_response(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<GetResponseRequest>,
) -> Result<Json<GetResponseReply>, AppError> {
    let cookie_header = headers.get(COOKIE).and_then(|value| value.to_str().ok());
    let chat_id = chat_id_from_cookies(&state.config.session_secret, cookie_header)
        .context("no active chat session")?;
    let user_input = body.message.trim().to_string();

    state
        .web_conversations
        .append(&chat_id, ChatMessage::user(user_input.clone()));
    let history = state.web_conversations.history(&chat_id);
    let answer =
        answer_with_memory(&state.http_client, &state.config, &history, &user_input).await?;
    state
        .web_conversations
        .append(&chat_id, ChatMessage::assistant(answer.clone()));

    tracing::info!(chat_id = %chat_id, turns = history.len() + 1, "answered web turn");
    Ok(Json(GetResponseReply { bot: answer }))
}

#[derive(Debug, Serialize)]
struct WebhookStatus {
    status: &'static str,
}

async fn telegram_webhook(
    State(state): State<AppState>,
    Json(update): Json<TelegramUpdate>,
) -> Result<Json<WebhookStatus>, AppError> {
    let Some(message) = update.message else {
        return Ok(Json(WebhookStatus { status: "ignored" }));
    };
    let user_text = message.text.unwrap_or_default();
    if user_text.is_empty() {
        return Ok(Json(WebhookStatus { status: "no text" }));
    }
    let chat_id = message.chat.id;
    let key = chat_id.to_string();

    state
        .telegram_conversations
        .append(&key, ChatMessage::user(user_text.clone()));
    let history = state.telegram_conversations.history(&key);
    let answer =
        answer_with_memory(&state.http_client, &state.config, &history, &user_text).await?;
    state
        .telegram_conversations
        .append(&key, ChatMessage::assistant(answer.clone()));

    send_telegram_message(&state.http_client, &state.config, chat_id, &answer).await?;
    tracing::info!(chat_id, "answered telegram turn");
    Ok(Json(WebhookStatus { status: "ok" }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
