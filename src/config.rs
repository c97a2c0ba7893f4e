use std::env;

use anyhow::{Context as _, Result};

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub session_secret: String,
    pub telegram_token: Option<String>,
    pub telegram_api_url: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_chat_model: String,
    pub arxiv_api_url: String,
    pub pubmed_base_url: String,
    pub max_results_per_source: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: parse_env_u16("PORT", 5000),
            session_secret: parse_env_string("SESSION_SECRET", "dev-secret-key"),
            telegram_token: env::var("TELEGRAM_TOKEN")
                .ok()
                .filter(|value| !value.trim().is_empty()),
            telegram_api_url: parse_env_string("TELEGRAM_API_URL", "https://api.telegram.org"),
            openai_api_key: parse_env_required("OPENAI_API_KEY")?,
            openai_base_url: parse_env_string("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            openai_chat_model: parse_env_string("OPENAI_CHAT_MODEL", "gpt-4o-mini"),
            arxiv_api_url: parse_env_string("ARXIV_API_URL", "http://export.arxiv.org/api/query"),
            pubmed_base_url: parse_env_string(
                "PUBMED_BASE_URL",
                "https://eutils.ncbi.nlm.nih.gov/entrez/eutils",
            ),
            max_results_per_source: parse_env_usize("MAX_RESULTS_PER_SOURCE", 3),
        })
    }
}

fn parse_env_required(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("{name} is not set"))
}

fn parse_env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(default)
}

fn parse_env_u16(name: &str, default: u16) -> u16 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(default)
}
