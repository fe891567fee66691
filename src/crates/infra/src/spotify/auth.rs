use application::auth::{CredentialExchange, TokenGrant};
use application::error::AppError;
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::SpotifyConfig;
use crate::http::error_body;

#[derive(Debug, Deserialize)]
struct RefreshTokenResponse {
    access_token: String,
    /// 有效期（秒）
    expires_in: i64,
}

/// 用长期 refresh token 换取短期 access token
pub struct SpotifyCredentialExchange {
    client: reqwest::Client,
    config: SpotifyConfig,
}

impl SpotifyCredentialExchange {
    pub fn new(client: reqwest::Client, config: SpotifyConfig) -> Self {
        Self { client, config }
    }

    fn parse_grant(body: &str) -> Result<TokenGrant, AppError> {
        let payload: RefreshTokenResponse =
            serde_json::from_str(body).map_err(|e| AppError::AuthRefresh {
                status: None,
                message: format!("Malformed token response: {}", e),
            })?;
        if payload.access_token.is_empty() {
            return Err(AppError::AuthRefresh {
                status: None,
                message: "Token response carried an empty access token".to_string(),
            });
        }
        Ok(TokenGrant {
            access_token: payload.access_token,
            expires_in: payload.expires_in,
        })
    }
}

#[async_trait]
impl CredentialExchange for SpotifyCredentialExchange {
    async fn refresh(&self) -> Result<TokenGrant, AppError> {
        log::debug!("Refreshing Spotify access token");

        let response = self
            .client
            .post(&self.config.auth_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.config.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::AuthRefresh {
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::AuthRefresh {
                status: Some(status.as_u16()),
                message: error_body(response).await,
            });
        }

        let body = response.text().await.map_err(|e| AppError::AuthRefresh {
            status: Some(status.as_u16()),
            message: e.to_string(),
        })?;
        Self::parse_grant(&body)
    }
}
