use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use log::debug;

use super::{Capability, ColorStrategy};
use crate::error::AppError;
use domain::color::ColorHex;
use domain::playback::PlaybackSnapshot;

/// 封面图片下载接口
#[async_trait]
pub trait ArtworkFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, AppError>;
}

/// 调色板提取接口（CPU 密集，同步实现）
pub trait PaletteExtractor: Send + Sync {
    /// 返回图片的 dark vibrant 色板颜色，没有则返回 None
    fn dark_vibrant(&self, image: &[u8]) -> Result<Option<ColorHex>, AppError>;
}

/// 专辑封面取色策略
pub struct AlbumArtColorStrategy {
    fetcher: Arc<dyn ArtworkFetcher>,
    palette: Arc<dyn PaletteExtractor>,
}

impl AlbumArtColorStrategy {
    pub fn new(fetcher: Arc<dyn ArtworkFetcher>, palette: Arc<dyn PaletteExtractor>) -> Self {
        Self { fetcher, palette }
    }

    pub async fn extract_color(&self, image_url: Option<&str>) -> Result<Option<ColorHex>, AppError> {
        let Some(url) = image_url.filter(|u| !u.is_empty()) else {
            debug!("No album image available");
            return Ok(None);
        };

        let image = self.fetcher.fetch(url).await?;
        let palette = self.palette.clone();
        let color = tokio::task::spawn_blocking(move || palette.dark_vibrant(&image))
            .await
            .map_err(|e| AppError::UnknownError(format!("Task join error: {}", e)))??;

        debug!("Album art dark vibrant color: {:?}", color);
        Ok(color)
    }
}

#[async_trait]
impl ColorStrategy for AlbumArtColorStrategy {
    fn capability(&self) -> Capability {
        Capability::AlbumArt
    }

    async fn extract(&self, track: &PlaybackSnapshot) -> Result<Option<ColorHex>, AppError> {
        self.extract_color(track.album_image_url.as_deref()).await
    }
}
