pub mod album_art;
pub mod lyrics;

pub use album_art::{AlbumArtColorStrategy, ArtworkFetcher, PaletteExtractor};
pub use lyrics::{CompletionClient, LyricsColorStrategy, LyricsProvider};

use async_trait::async_trait;
use std::fmt;

use crate::error::AppError;
use domain::color::ColorHex;
use domain::playback::PlaybackSnapshot;

/// 取色能力标签，解析计划按标签顺序尝试
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    AlbumArt,
    Lyrics,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::AlbumArt => write!(f, "album_art"),
            Capability::Lyrics => write!(f, "lyrics"),
        }
    }
}

/// 取色策略（责任链节点）
///
/// 返回 `Ok(None)` 表示没有可用结果，交给下一个策略。
#[async_trait]
pub trait ColorStrategy: Send + Sync {
    fn capability(&self) -> Capability;

    async fn extract(&self, track: &PlaybackSnapshot) -> Result<Option<ColorHex>, AppError>;
}
