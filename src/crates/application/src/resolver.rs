use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::{debug, info};

use crate::error::AppError;
use crate::playback::PlaybackStateClient;
use crate::strategy::{Capability, ColorStrategy};
use domain::color::{self, ColorHex};
use domain::playback::PlaybackSnapshot;

/// 取色来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Album,
    Lyrics,
}

impl ColorMode {
    /// 按顺序尝试的能力列表：歌词优先，封面兜底
    pub fn plan(&self) -> &'static [Capability] {
        match self {
            ColorMode::Album => &[Capability::AlbumArt],
            ColorMode::Lyrics => &[Capability::Lyrics, Capability::AlbumArt],
        }
    }
}

impl FromStr for ColorMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "album" => Ok(ColorMode::Album),
            "lyrics" => Ok(ColorMode::Lyrics),
            other => Err(AppError::UnsupportedMode(other.to_string())),
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorMode::Album => write!(f, "album"),
            ColorMode::Lyrics => write!(f, "lyrics"),
        }
    }
}

/// 当前播放取色服务
///
/// 获取播放快照后按模式的计划依次尝试已注册的策略，第一个给出颜色的胜出。
/// 计划中没有注册策略的能力（例如关闭了歌词功能）直接跳过。
pub struct ColorResolver {
    playback: Arc<PlaybackStateClient>,
    strategies: Vec<Arc<dyn ColorStrategy>>,
}

impl ColorResolver {
    pub fn new(playback: Arc<PlaybackStateClient>, strategies: Vec<Arc<dyn ColorStrategy>>) -> Self {
        Self {
            playback,
            strategies,
        }
    }

    /// 没有在播放时直接返回 `None`，此时不校验模式
    pub async fn resolve(&self, mode: &str) -> Result<Option<ColorHex>, AppError> {
        let Some(track) = self.playing_track().await? else {
            return Ok(None);
        };
        let mode = mode.parse::<ColorMode>()?;
        self.resolve_track(mode, &track).await
    }

    pub async fn resolve_mode(&self, mode: ColorMode) -> Result<Option<ColorHex>, AppError> {
        match self.playing_track().await? {
            Some(track) => self.resolve_track(mode, &track).await,
            None => Ok(None),
        }
    }

    async fn playing_track(&self) -> Result<Option<PlaybackSnapshot>, AppError> {
        let track = self.playback.get_playback_state().await?;
        if !track.is_playing {
            debug!("Nothing is playing, no color");
            return Ok(None);
        }
        Ok(Some(track))
    }

    async fn resolve_track(
        &self,
        mode: ColorMode,
        track: &PlaybackSnapshot,
    ) -> Result<Option<ColorHex>, AppError> {
        for capability in mode.plan() {
            for strategy in self.strategies_for(*capability) {
                if let Some(color) = strategy.extract(track).await? {
                    info!(
                        "Resolved color {} for '{}' via {}",
                        color, track.track_name, capability
                    );
                    return Ok(Some(color));
                }
                debug!("Strategy {} yielded no color, falling back", capability);
            }
        }
        Ok(None)
    }

    /// 取色后映射到调用方调色板中最接近的颜色；调色板为空时原样返回
    pub async fn resolve_with_palette(
        &self,
        mode: &str,
        palette: &[ColorHex],
    ) -> Result<Option<ColorHex>, AppError> {
        let color = self.resolve(mode).await?;
        match color {
            Some(color) if !palette.is_empty() => Ok(Some(color::nearest(&color, palette)?)),
            other => Ok(other),
        }
    }

    fn strategies_for(&self, capability: Capability) -> impl Iterator<Item = &Arc<dyn ColorStrategy>> {
        self.strategies
            .iter()
            .filter(move |s| s.capability() == capability)
    }
}
