//! Answer pipeline: literature retrieval, history windowing, and the
//! chat-completion call.

use anyhow::{bail, Context as _, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::papers::{build_research_context, fetch_arxiv_papers, fetch_pubmed_papers};

/// How many prior conversation messages are forwarded to the model. Older
/// messages stay in the store but are silently dropped from the request.
pub const HISTORY_WINDOW: usize = 10;

const CHAT_TEMPERATURE: f32 = 0.2;
const CHAT_MAX_TOKENS: u32 = 600;

const SYSTEM_PROMPT: &str = "You are a medical research assistant.\n\
Use previous conversation context.\n\
Ground answers in scientific research.\n\
If evidence is weak, say so clearly.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Answer `question` grounded in freshly fetched literature, using the last
/// [`HISTORY_WINDOW`] messages of `history` for conversational context.
///
/// Three sequential outbound calls (arXiv, PubMed, chat completion); any
/// fault in any of them propagates to the caller. No retries.
pub async fn answer_with_memory(
    client: &Client,
    config: &Config,
    history: &[ChatMessage],
    question: &str,
) -> Result<String> {
    let limit = config.max_results_per_source;
    let mut papers = fetch_arxiv_papers(client, config, question, limit).await?;
    papers.extend(fetch_pubmed_papers(client, config, question, limit).await?);

    let research_context = build_research_context(&papers);
    let messages = build_outbound_messages(history, &research_context, question);
    let reply = complete_chat(client, config, &messages).await?;
    Ok(reply.trim().to_string())
}

pub fn build_outbound_messages(
    history: &[ChatMessage],
    research_context: &str,
    question: &str,
) -> Vec<ChatMessage> {
    let window_start = history.len().saturating_sub(HISTORY_WINDOW);
    let mut messages = Vec::with_capacity(history.len() - window_start + 2);
    messages.push(ChatMessage::system(SYSTEM_PROMPT));
    messages.extend(history[window_start..].iter().cloned());
    messages.push(ChatMessage::user(format!(
        "RESEARCH:\n{research_context}\n\nQUESTION:\n{question}"
    )));
    messages
}

async fn complete_chat(
    client: &Client,
    config: &Config,
    messages: &[ChatMessage],
) -> Result<String> {
    let url = format!(
        "{}/chat/completions",
        config.openai_base_url.trim_end_matches('/')
    );
    let body = ChatRequest {
        model: &config.openai_chat_model,
        messages,
        temperature: CHAT_TEMPERATURE,
        max_tokens: CHAT_MAX_TOKENS,
    };
    let response = client
        .post(url)
        .bearer_auth(&config.openai_api_key)
        .json(&body)
        .send()
        .await
        .context("send chat completion request")?;
    let status = response.status();
    let payload = response
        .text()
        .await
        .context("read chat completion body")?;
    if !status.is_success() {
        bail!("chat completion API error: {} {}", status, payload);
    }
    let parsed: ChatCompletionResponse =
        serde_json::from_str(&payload).context("parse chat completion response")?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| anyhow::anyhow!("chat completion returned no choices"))
}
