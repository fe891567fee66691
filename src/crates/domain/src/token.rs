use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 令牌存储错误
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("token store error: {0}")]
    StoreErr(String),
    #[error("token record corrupted: {0}")]
    Corrupted(String),
}

/// 访问令牌值对象
///
/// 远程播放服务的短期 bearer 凭证。当且仅当 `expires_at > now` 时有效。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    #[serde(rename = "access_token")]
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// 根据授权服务返回的 `expires_in`（秒）计算过期时间，超出时间范围时返回 `None`
    pub fn expiring_in(value: impl Into<String>, expires_in_secs: i64) -> Option<Self> {
        let expires_at = Duration::try_seconds(expires_in_secs)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))?;
        Some(Self::new(value, expires_at))
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

/// 存储中的令牌记录，`id` 由存储分配，仅用于批量删除
#[derive(Debug, Clone, PartialEq)]
pub struct StoredToken {
    pub id: String,
    pub token: AccessToken,
}

/// 令牌仓储接口
///
/// 多个调用之间共享的扁平集合，没有事务或锁语义：
/// 并发刷新可能同时写入多条有效记录，任取其一即可。
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// 列出全部令牌记录
    async fn list_all(&self) -> Result<Vec<StoredToken>, TokenError>;

    /// 写入一条新记录，返回分配的 id
    async fn insert(&self, token: &AccessToken) -> Result<String, TokenError>;

    /// 按 id 批量删除
    async fn delete_many(&self, ids: &[String]) -> Result<(), TokenError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_is_strict() {
        let now = Utc::now();
        let token = AccessToken::new("abc", now);
        assert!(!token.is_valid_at(now));
        assert!(token.is_valid_at(now - Duration::seconds(1)));
    }

    #[test]
    fn test_expiring_in() {
        assert!(AccessToken::expiring_in("abc", 3600).unwrap().is_valid());
        assert!(!AccessToken::expiring_in("abc", -1).unwrap().is_valid());
    }

    #[test]
    fn test_expiring_in_out_of_range() {
        assert!(AccessToken::expiring_in("abc", i64::MAX).is_none());
        assert!(AccessToken::expiring_in("abc", i64::MIN).is_none());
        // 秒数合法但加到当前时间后溢出
        assert!(AccessToken::expiring_in("abc", 400_000 * 365 * 86_400).is_none());
    }
}
