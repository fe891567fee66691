use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};

use crate::auth::TokenCache;
use crate::error::AppError;
use domain::playback::PlaybackSnapshot;

/// 远程播放状态接口，由基础设施层实现
///
/// 非 2xx 响应返回 `AppError::PlaybackFetch`，并带上 HTTP 状态码。
#[async_trait]
pub trait PlaybackSource: Send + Sync {
    async fn fetch(&self, bearer: &str) -> Result<PlaybackSnapshot, AppError>;
}

pub struct PlaybackStateClient {
    tokens: Arc<TokenCache>,
    source: Arc<dyn PlaybackSource>,
}

impl PlaybackStateClient {
    pub fn new(tokens: Arc<TokenCache>, source: Arc<dyn PlaybackSource>) -> Self {
        Self { tokens, source }
    }

    /// 获取当前播放快照
    ///
    /// 401 说明缓存的令牌已在带外失效：强制刷新一次并重试一次，
    /// 其余失败直接返回。
    pub async fn get_playback_state(&self) -> Result<PlaybackSnapshot, AppError> {
        let bearer = self.tokens.get_valid_token().await?;
        let snapshot = match self.source.fetch(&bearer).await {
            Err(e) if e.is_unauthorized() => {
                warn!("Playback endpoint rejected cached token, refreshing once: {}", e);
                let bearer = self.tokens.force_refresh().await?;
                self.source.fetch(&bearer).await?
            }
            other => other?,
        };
        debug!(
            "Playback state: playing={}, track='{}'",
            snapshot.is_playing, snapshot.track_name
        );
        Ok(snapshot)
    }
}
