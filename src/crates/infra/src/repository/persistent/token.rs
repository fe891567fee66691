use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::token::{AccessToken, StoredToken, TokenError, TokenRepository};
use sled::{Batch, Tree};
use std::path::PathBuf;
use uuid::Uuid;

/// 令牌集合名，沿用远端存储里的集合命名
const TOKEN_TREE: &str = "spotify_auth";

/// 基于 sled 的持久化令牌仓储，进程重启后令牌仍可复用
pub struct SledTokenRepository {
    tree: Tree,
}

impl SledTokenRepository {
    /// # Arguments
    /// * `db_path` - sled 数据库路径
    pub fn new(db_path: PathBuf) -> Result<Self, sled::Error> {
        let db = sled::open(db_path)?;
        let tree = db.open_tree(TOKEN_TREE)?;

        Ok(Self { tree })
    }

    // 无法解析的记录按已过期处理，下一次刷新时会被一并清理
    fn decode(id: String, value: &[u8]) -> StoredToken {
        let token = serde_json::from_slice::<AccessToken>(value).unwrap_or_else(|e| {
            log::warn!("Token record {} is corrupted, treating as expired: {}", id, e);
            AccessToken::new(String::new(), DateTime::<Utc>::MIN_UTC)
        });
        StoredToken { id, token }
    }
}

fn store_err(e: sled::Error) -> TokenError {
    TokenError::StoreErr(e.to_string())
}

#[async_trait]
impl TokenRepository for SledTokenRepository {
    async fn list_all(&self) -> Result<Vec<StoredToken>, TokenError> {
        let mut tokens = Vec::new();
        for entry in self.tree.iter() {
            let (key, value) = entry.map_err(store_err)?;
            match std::str::from_utf8(&key) {
                Ok(id) => tokens.push(Self::decode(id.to_string(), &value)),
                // 无法用字符串 id 删除，读到时直接移除
                Err(e) => {
                    log::warn!("Dropping token record with non UTF-8 key {:?}: {}", key, e);
                    self.tree.remove(&key).map_err(store_err)?;
                }
            }
        }
        Ok(tokens)
    }

    async fn insert(&self, token: &AccessToken) -> Result<String, TokenError> {
        let id = Uuid::new_v4().to_string();
        let value =
            serde_json::to_vec(token).map_err(|e| TokenError::StoreErr(e.to_string()))?;

        self.tree.insert(id.as_bytes(), value).map_err(store_err)?;
        self.tree.flush_async().await.map_err(store_err)?;
        Ok(id)
    }

    async fn delete_many(&self, ids: &[String]) -> Result<(), TokenError> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut batch = Batch::default();
        for id in ids {
            batch.remove(id.as_bytes());
        }
        self.tree.apply_batch(batch).map_err(store_err)?;
        self.tree.flush_async().await.map_err(store_err)?;
        Ok(())
    }
}
