//! 应用层单元测试共用的端口替身

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use crate::auth::{CredentialExchange, TokenCache, TokenGrant};
use crate::error::AppError;
use crate::playback::{PlaybackSource, PlaybackStateClient};
use crate::strategy::{ArtworkFetcher, Capability, ColorStrategy, PaletteExtractor};
use domain::color::ColorHex;
use domain::playback::PlaybackSnapshot;
use domain::token::{AccessToken, StoredToken, TokenError, TokenRepository};

#[derive(Default)]
pub struct MemoryTokenRepository {
    records: Mutex<Vec<StoredToken>>,
    next_id: AtomicUsize,
}

impl MemoryTokenRepository {
    pub fn with_tokens(tokens: Vec<AccessToken>) -> Self {
        let repo = Self::default();
        {
            let mut records = repo.records.lock().unwrap();
            for token in tokens {
                let id = repo.next_id.fetch_add(1, Ordering::SeqCst).to_string();
                records.push(StoredToken { id, token });
            }
        }
        repo
    }

    pub fn snapshot(&self) -> Vec<StoredToken> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenRepository for MemoryTokenRepository {
    async fn list_all(&self) -> Result<Vec<StoredToken>, TokenError> {
        Ok(self.snapshot())
    }

    async fn insert(&self, token: &AccessToken) -> Result<String, TokenError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        self.records.lock().unwrap().push(StoredToken {
            id: id.clone(),
            token: token.clone(),
        });
        Ok(id)
    }

    async fn delete_many(&self, ids: &[String]) -> Result<(), TokenError> {
        self.records
            .lock()
            .unwrap()
            .retain(|r| !ids.contains(&r.id));
        Ok(())
    }
}

pub struct FakeExchange {
    access_token: String,
    expires_in: i64,
    calls: AtomicUsize,
    failure: Mutex<Option<u16>>,
}

impl FakeExchange {
    pub fn new(access_token: &str, expires_in: i64) -> Self {
        Self {
            access_token: access_token.to_string(),
            expires_in,
            calls: AtomicUsize::new(0),
            failure: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_with_status(&self, status: u16) {
        *self.failure.lock().unwrap() = Some(status);
    }
}

#[async_trait]
impl CredentialExchange for FakeExchange {
    async fn refresh(&self) -> Result<TokenGrant, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = *self.failure.lock().unwrap() {
            return Err(AppError::AuthRefresh {
                status: Some(status),
                message: "invalid_grant".to_string(),
            });
        }
        Ok(TokenGrant {
            access_token: self.access_token.clone(),
            expires_in: self.expires_in,
        })
    }
}

/// 按顺序返回预置结果，并记录每次使用的 bearer 令牌
#[derive(Default)]
pub struct ScriptedPlaybackSource {
    responses: Mutex<VecDeque<Result<PlaybackSnapshot, AppError>>>,
    bearers: Mutex<Vec<String>>,
}

impl ScriptedPlaybackSource {
    pub fn new(responses: Vec<Result<PlaybackSnapshot, AppError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            bearers: Mutex::new(Vec::new()),
        }
    }

    pub fn bearers(&self) -> Vec<String> {
        self.bearers.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlaybackSource for ScriptedPlaybackSource {
    async fn fetch(&self, bearer: &str) -> Result<PlaybackSnapshot, AppError> {
        self.bearers.lock().unwrap().push(bearer.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(PlaybackSnapshot::idle()))
    }
}

pub fn unauthorized() -> AppError {
    AppError::PlaybackFetch {
        status: Some(401),
        message: "The access token expired".to_string(),
    }
}

pub fn playing(track: &str, artist: &str, image_url: Option<&str>) -> PlaybackSnapshot {
    PlaybackSnapshot {
        is_playing: true,
        track_name: track.to_string(),
        primary_artist: artist.to_string(),
        album_image_url: image_url.map(str::to_string),
    }
}

/// 基于预置快照的播放状态客户端，令牌存储中放一条有效令牌
pub fn playback_client(snapshot: PlaybackSnapshot) -> Arc<PlaybackStateClient> {
    let repo = Arc::new(MemoryTokenRepository::with_tokens(vec![
        AccessToken::expiring_in("cached", 3600).unwrap(),
    ]));
    let exchange = Arc::new(FakeExchange::new("fresh", 3600));
    let tokens = Arc::new(TokenCache::new(repo, exchange));
    let source = Arc::new(ScriptedPlaybackSource::new(vec![Ok(snapshot)]));
    Arc::new(PlaybackStateClient::new(tokens, source))
}

/// 固定输出的策略，记录调用次数
pub struct StaticStrategy {
    capability: Capability,
    color: Option<ColorHex>,
    calls: AtomicUsize,
}

impl StaticStrategy {
    pub fn new(capability: Capability, color: Option<&str>) -> Self {
        Self {
            capability,
            color: color.map(|c| ColorHex::parse(c).unwrap()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ColorStrategy for StaticStrategy {
    fn capability(&self) -> Capability {
        self.capability
    }

    async fn extract(&self, _track: &PlaybackSnapshot) -> Result<Option<ColorHex>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.color.clone())
    }
}

/// 按 URL 返回图片字节，测试里图片内容直接写成颜色
pub struct MapFetcher {
    images: HashMap<String, Bytes>,
    pub calls: AtomicUsize,
}

impl MapFetcher {
    pub fn new(images: &[(&str, &str)]) -> Self {
        Self {
            images: images
                .iter()
                .map(|(u, c)| (u.to_string(), Bytes::from(c.to_string())))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ArtworkFetcher for MapFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.images
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::Artwork(format!("404 for {}", url)))
    }
}

/// 把图片字节当作颜色文本解析，空图片视为没有色板
pub struct EchoPalette;

impl PaletteExtractor for EchoPalette {
    fn dark_vibrant(&self, image: &[u8]) -> Result<Option<ColorHex>, AppError> {
        if image.is_empty() {
            return Ok(None);
        }
        let text = String::from_utf8_lossy(image);
        Ok(Some(ColorHex::parse(&text)?))
    }
}
