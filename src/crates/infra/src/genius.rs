use application::error::AppError;
use application::strategy::LyricsProvider;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::config::GeniusConfig;
use crate::http::error_body;

const LYRICS_CONTAINER: &str = "data-lyrics-container=\"true\"";

lazy_static! {
    static ref BRACKETED_RX: Regex = Regex::new(r"\s*(\([^)]*\)|\[[^\]]*\])").unwrap();
    static ref BREAK_RX: Regex = Regex::new(r"(?i)<br\s*/?>").unwrap();
    static ref TAG_RX: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref DIV_RX: Regex = Regex::new(r"(?i)<div\b|</div\s*>").unwrap();
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    response: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    result: SongResult,
}

#[derive(Debug, Deserialize)]
struct SongResult {
    url: String,
}

/// 精简搜索词：去掉 " - Remastered" 之类的后缀和括号内容，统一小写
pub fn optimize_query(title: &str, artist: &str) -> String {
    let title = title.split(" - ").next().unwrap_or(title);
    let combined = format!("{} {}", title, artist).to_lowercase();
    BRACKETED_RX
        .replace_all(&combined, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// 从歌曲页面中提取全部歌词容器的纯文本
pub fn extract_lyrics(html: &str) -> Option<String> {
    let mut sections = Vec::new();
    let mut rest = html;

    while let Some(pos) = rest.find(LYRICS_CONTAINER) {
        let tail = &rest[pos..];
        let Some(open_end) = tail.find('>') else {
            break;
        };
        let body = &tail[open_end + 1..];

        // 容器内还有嵌套 div，按深度找到对应的闭合标签
        let mut depth = 1usize;
        let mut end = body.len();
        for m in DIV_RX.find_iter(body) {
            if m.as_str().starts_with("</") {
                depth -= 1;
                if depth == 0 {
                    end = m.start();
                    break;
                }
            } else {
                depth += 1;
            }
        }

        sections.push(fragment_to_text(&body[..end]));
        rest = &body[end..];
    }

    let text = sections.join("\n").trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn fragment_to_text(fragment: &str) -> String {
    let with_breaks = BREAK_RX.replace_all(fragment, "\n");
    let plain = TAG_RX.replace_all(&with_breaks, "");
    decode_entities(&plain)
}

fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Genius 歌词提供方：搜索取第一条结果，再抓取其歌曲页面
pub struct GeniusLyricsProvider {
    client: reqwest::Client,
    config: GeniusConfig,
}

impl GeniusLyricsProvider {
    pub fn new(client: reqwest::Client, config: GeniusConfig) -> Self {
        Self { client, config }
    }

    fn access_token(&self) -> Result<&str, AppError> {
        self.config.access_token.as_deref().ok_or_else(|| {
            AppError::Configuration("Genius access token is required for this operation".to_string())
        })
    }

    async fn search_song_url(&self, query: &str) -> Result<Option<String>, AppError> {
        let url = format!("{}/search", self.config.api_base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", query)])
            .bearer_auth(self.access_token()?)
            .send()
            .await
            .map_err(|e| AppError::LyricsFetch(format!("Genius search failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::LyricsFetch(format!(
                "Genius search failed: HTTP {}: {}",
                status,
                error_body(response).await
            )));
        }

        let payload: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::LyricsFetch(format!("Malformed Genius search response: {}", e)))?;
        Ok(payload.response.hits.into_iter().next().map(|h| h.result.url))
    }

    async fn fetch_page(&self, url: &str) -> Result<String, AppError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::LyricsFetch(format!("Failed to load lyrics page: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::LyricsFetch(format!(
                "Failed to load lyrics page {}: HTTP {}",
                url,
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AppError::LyricsFetch(format!("Failed to read lyrics page: {}", e)))
    }
}

#[async_trait]
impl LyricsProvider for GeniusLyricsProvider {
    fn ensure_configured(&self) -> Result<(), AppError> {
        self.access_token().map(|_| ())
    }

    async fn fetch_lyrics(&self, title: &str, artist: &str) -> Result<Option<String>, AppError> {
        let query = optimize_query(title, artist);
        log::debug!("Searching Genius for '{}'", query);

        let Some(song_url) = self.search_song_url(&query).await? else {
            return Ok(None);
        };
        let html = self.fetch_page(&song_url).await?;
        Ok(extract_lyrics(&html))
    }
}
