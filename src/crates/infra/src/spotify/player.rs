use application::error::AppError;
use application::playback::PlaybackSource;
use async_trait::async_trait;
use domain::playback::PlaybackSnapshot;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::http::error_body;

#[derive(Debug, Default, Deserialize)]
struct PlayerResponse {
    #[serde(default)]
    is_playing: bool,
    item: Option<TrackItem>,
}

/// 播客单集没有 artists / album，按缺省处理
#[derive(Debug, Default, Deserialize)]
struct TrackItem {
    #[serde(default)]
    name: String,
    #[serde(default)]
    artists: Vec<ArtistItem>,
    album: Option<AlbumItem>,
}

#[derive(Debug, Deserialize)]
struct ArtistItem {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct AlbumItem {
    #[serde(default)]
    images: Vec<ImageItem>,
}

#[derive(Debug, Deserialize)]
struct ImageItem {
    url: String,
}

impl From<PlayerResponse> for PlaybackSnapshot {
    fn from(response: PlayerResponse) -> Self {
        let Some(item) = response.item else {
            return PlaybackSnapshot::idle();
        };
        PlaybackSnapshot {
            is_playing: response.is_playing,
            track_name: item.name,
            primary_artist: item
                .artists
                .into_iter()
                .next()
                .map(|a| a.name)
                .unwrap_or_default(),
            // 封面按尺寸降序排列，取最大的一张
            album_image_url: item
                .album
                .and_then(|a| a.images.into_iter().next())
                .map(|i| i.url),
        }
    }
}

/// 播放器状态接口适配器
pub struct SpotifyPlaybackSource {
    client: reqwest::Client,
    player_url: String,
}

impl SpotifyPlaybackSource {
    pub fn new(client: reqwest::Client, player_url: String) -> Self {
        Self { client, player_url }
    }

    fn parse_snapshot(body: &str) -> Result<PlaybackSnapshot, AppError> {
        if body.trim().is_empty() {
            return Ok(PlaybackSnapshot::idle());
        }
        let response: PlayerResponse =
            serde_json::from_str(body).map_err(|e| AppError::PlaybackFetch {
                status: None,
                message: format!("Malformed player response: {}", e),
            })?;
        Ok(response.into())
    }
}

#[async_trait]
impl PlaybackSource for SpotifyPlaybackSource {
    async fn fetch(&self, bearer: &str) -> Result<PlaybackSnapshot, AppError> {
        let response = self
            .client
            .get(&self.player_url)
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| AppError::PlaybackFetch {
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            log::debug!("No active playback device");
            return Ok(PlaybackSnapshot::idle());
        }
        if !status.is_success() {
            return Err(AppError::PlaybackFetch {
                status: Some(status.as_u16()),
                message: error_body(response).await,
            });
        }

        let body = response.text().await.map_err(|e| AppError::PlaybackFetch {
            status: Some(status.as_u16()),
            message: e.to_string(),
        })?;
        Self::parse_snapshot(&body)
    }
}
