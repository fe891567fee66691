use domain::color::ColorError;
use domain::token::TokenError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// 缺少必需的凭证，不重试
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Auth refresh error{}: {message}", status_suffix(.status))]
    AuthRefresh {
        status: Option<u16>,
        message: String,
    },

    #[error("Token store error: {0}")]
    TokenStore(#[from] TokenError),

    #[error("Playback fetch error{}: {message}", status_suffix(.status))]
    PlaybackFetch {
        status: Option<u16>,
        message: String,
    },

    #[error("Unsupported mode: {0}")]
    UnsupportedMode(String),

    #[error("Artwork error: {0}")]
    Artwork(String),

    #[error("Lyrics fetch error: {0}")]
    LyricsFetch(String),

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Color error: {0}")]
    Color(#[from] ColorError),

    #[error("Unknown error: {0}")]
    UnknownError(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

impl AppError {
    /// 远程播放服务拒绝了当前令牌
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AppError::PlaybackFetch {
                status: Some(401),
                ..
            }
        )
    }
}
