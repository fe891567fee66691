use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};

use crate::error::AppError;
use domain::token::{AccessToken, TokenRepository};

/// 授权服务返回的新令牌
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    /// 有效期（秒）
    pub expires_in: i64,
}

/// 凭证交换接口（refresh_token grant），由基础设施层实现
#[async_trait]
pub trait CredentialExchange: Send + Sync {
    async fn refresh(&self) -> Result<TokenGrant, AppError>;
}

/// 访问令牌缓存
///
/// 令牌保存在共享的持久化存储中，跨调用复用。查找时若没有有效令牌，
/// 先清理已读到的全部记录，再走 refresh_token 交换并写入新记录。
///
/// 读取、删除、刷新、写入之间不加锁：两个并发请求可能各自刷新并各写一条，
/// 两条都是真实有效的令牌，下一次查找任取其一。
#[derive(Clone)]
pub struct TokenCache {
    repo: Arc<dyn TokenRepository>,
    exchange: Arc<dyn CredentialExchange>,
}

impl TokenCache {
    pub fn new(repo: Arc<dyn TokenRepository>, exchange: Arc<dyn CredentialExchange>) -> Self {
        Self { repo, exchange }
    }

    /// 返回一个有效的 bearer 令牌，必要时刷新
    pub async fn get_valid_token(&self) -> Result<String, AppError> {
        let records = self.repo.list_all().await?;
        let now = Utc::now();

        if let Some(record) = records.iter().find(|r| r.token.is_valid_at(now)) {
            debug!(
                "Using cached access token (expires at {})",
                record.token.expires_at
            );
            return Ok(record.token.value.clone());
        }

        let stale: Vec<String> = records.into_iter().map(|r| r.id).collect();
        self.purge(&stale).await;
        self.refresh().await
    }

    /// 丢弃存储中的全部令牌并强制刷新
    ///
    /// 仅用于远程服务拒绝了一个尚未过期的令牌的情况。
    pub async fn force_refresh(&self) -> Result<String, AppError> {
        let ids: Vec<String> = self
            .repo
            .list_all()
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();
        self.purge(&ids).await;
        self.refresh().await
    }

    async fn refresh(&self) -> Result<String, AppError> {
        let grant = self.exchange.refresh().await?;
        let token = AccessToken::expiring_in(grant.access_token, grant.expires_in).ok_or_else(
            || AppError::AuthRefresh {
                status: None,
                message: format!("Token lifetime out of range: {}s", grant.expires_in),
            },
        )?;
        self.repo.insert(&token).await?;
        info!("Access token refreshed, expires at {}", token.expires_at);
        Ok(token.value)
    }

    // 清理失败不影响刷新，下一次查找会再次清理
    async fn purge(&self, ids: &[String]) {
        if ids.is_empty() {
            return;
        }
        match self.repo.delete_many(ids).await {
            Ok(()) => debug!("Removed {} stale access token(s)", ids.len()),
            Err(e) => warn!("Failed to remove stale access tokens: {}", e),
        }
    }
}
