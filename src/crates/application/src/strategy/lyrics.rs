use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;

use super::{Capability, ColorStrategy};
use crate::error::AppError;
use domain::color::ColorHex;
use domain::playback::PlaybackSnapshot;

lazy_static! {
    static ref HEX_COLOR_RX: Regex = Regex::new(r"(?i)#(?:[0-9a-f]{3}){1,2}\b").unwrap();
}

/// 歌词提供方接口
#[async_trait]
pub trait LyricsProvider: Send + Sync {
    /// 缺少访问凭证时返回 `AppError::Configuration`
    fn ensure_configured(&self) -> Result<(), AppError>;

    async fn fetch_lyrics(&self, title: &str, artist: &str) -> Result<Option<String>, AppError>;
}

/// 文本补全接口
#[async_trait]
pub trait CompletionClient: Send + Sync {
    fn ensure_configured(&self) -> Result<(), AppError>;

    /// 返回第一个候选的文本
    async fn complete(&self, prompt: &str) -> Result<Option<String>, AppError>;
}

pub fn color_prompt(lyrics: &str) -> String {
    format!(
        "Answer me with only a color hex string, what color would you associate with the lyrics: \"{}\"?",
        lyrics
    )
}

/// 取补全文本中第一个形如 `#RGB` / `#RRGGBB` 的片段
pub fn extract_hex_color(text: &str) -> Option<ColorHex> {
    HEX_COLOR_RX
        .find(text)
        .and_then(|m| ColorHex::parse(m.as_str()).ok())
}

/// 歌词取色策略
///
/// 先取歌词，再让补全模型给出一个与歌词相关的颜色。
/// 可选路径上的传输失败只记录日志并视为无结果，交给后续策略兜底；
/// 缺少凭证属于配置错误，直接返回。
pub struct LyricsColorStrategy {
    lyrics: Arc<dyn LyricsProvider>,
    completion: Arc<dyn CompletionClient>,
}

impl LyricsColorStrategy {
    pub fn new(lyrics: Arc<dyn LyricsProvider>, completion: Arc<dyn CompletionClient>) -> Self {
        Self { lyrics, completion }
    }

    pub async fn extract_color(&self, title: &str, artist: &str) -> Result<Option<ColorHex>, AppError> {
        self.lyrics.ensure_configured()?;
        self.completion.ensure_configured()?;

        let lyrics = match degrade(self.lyrics.fetch_lyrics(title, artist).await, "lyrics")? {
            Some(lyrics) if !lyrics.trim().is_empty() => lyrics,
            _ => {
                debug!("No lyrics found for '{}' by '{}'", title, artist);
                return Ok(None);
            }
        };

        let prompt = color_prompt(lyrics.trim());
        let text = degrade(self.completion.complete(&prompt).await, "completion")?;
        let color = text.as_deref().and_then(extract_hex_color);
        if color.is_none() {
            debug!("Completion returned no hex color: {:?}", text);
        }
        Ok(color)
    }
}

// 配置错误照常返回，其余失败降级为无结果
fn degrade(result: Result<Option<String>, AppError>, what: &str) -> Result<Option<String>, AppError> {
    match result {
        Err(e @ AppError::Configuration(_)) => Err(e),
        Err(e) => {
            warn!("Lyrics color {} call failed, treating as no result: {}", what, e);
            Ok(None)
        }
        ok => ok,
    }
}

#[async_trait]
impl ColorStrategy for LyricsColorStrategy {
    fn capability(&self) -> Capability {
        Capability::Lyrics
    }

    async fn extract(&self, track: &PlaybackSnapshot) -> Result<Option<ColorHex>, AppError> {
        self.extract_color(&track.track_name, &track.primary_artist)
            .await
    }
}
