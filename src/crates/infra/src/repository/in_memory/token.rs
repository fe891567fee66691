use async_trait::async_trait;
use dashmap::DashMap;
use domain::token::{AccessToken, StoredToken, TokenError, TokenRepository};
use std::sync::Arc;
use uuid::Uuid;

/// 进程内令牌仓储，重启即丢失
#[derive(Clone, Default)]
pub struct InMemoryTokenRepository {
    store: Arc<DashMap<String, AccessToken>>,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self {
            store: Arc::new(DashMap::new()),
        }
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn list_all(&self) -> Result<Vec<StoredToken>, TokenError> {
        Ok(self
            .store
            .iter()
            .map(|e| StoredToken {
                id: e.key().clone(),
                token: e.value().clone(),
            })
            .collect())
    }

    async fn insert(&self, token: &AccessToken) -> Result<String, TokenError> {
        let id = Uuid::new_v4().to_string();
        self.store.insert(id.clone(), token.clone());
        Ok(id)
    }

    async fn delete_many(&self, ids: &[String]) -> Result<(), TokenError> {
        for id in ids {
            self.store.remove(id);
        }
        Ok(())
    }
}
