use application::error::AppError;
use application::strategy::ArtworkFetcher;
use async_trait::async_trait;
use bytes::Bytes;

/// 通过 HTTP 下载专辑封面
pub struct HttpArtworkFetcher {
    client: reqwest::Client,
}

impl HttpArtworkFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ArtworkFetcher for HttpArtworkFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, AppError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Artwork(format!("Failed to download image: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Artwork(format!(
                "Failed to download image: HTTP {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Artwork(format!("Failed to read image data: {}", e)))?;
        log::debug!("Downloaded {} bytes of artwork from {}", bytes.len(), url);
        Ok(bytes)
    }
}
