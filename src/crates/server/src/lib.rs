pub mod color_api;
pub mod consts;
pub mod middleware;

use application::auth::TokenCache;
use application::playback::PlaybackStateClient;
use application::resolver::ColorResolver;
use application::strategy::{AlbumArtColorStrategy, ColorStrategy, LyricsColorStrategy};
use domain::token::TokenRepository;
use infra::config::{AppConfigImpl, TokenStoreBackend};
use infra::{
    http, GeniusLyricsProvider, HttpArtworkFetcher, InMemoryTokenRepository,
    OpenAiCompletionClient, SledTokenRepository, SpotifyCredentialExchange,
    SpotifyPlaybackSource, VibrantPaletteExtractor,
};
use log::info;
use std::sync::Arc;

pub struct AppState {
    pub app_cfg: AppConfigImpl,
    pub resolver: Arc<ColorResolver>,
}

impl AppState {
    pub fn new(app_cfg: AppConfigImpl) -> Self {
        let client =
            http::build_client(app_cfg.http_timeout()).expect("Failed to create HTTP client");
        let spotify_cfg = app_cfg.spotify();

        // 初始化令牌存储
        let token_store_cfg = app_cfg.token_store();
        let token_repo: Arc<dyn TokenRepository> = match token_store_cfg.backend {
            TokenStoreBackend::Sled => Arc::new(
                SledTokenRepository::new(token_store_cfg.path.clone())
                    .expect("Failed to open token store"),
            ),
            TokenStoreBackend::Memory => Arc::new(InMemoryTokenRepository::new()),
        };
        info!(
            "Token store initialized ({:?}, {})",
            token_store_cfg.backend,
            token_store_cfg.path.display()
        );

        let exchange = Arc::new(SpotifyCredentialExchange::new(
            client.clone(),
            spotify_cfg.clone(),
        ));
        let tokens = Arc::new(TokenCache::new(token_repo, exchange));
        let source = Arc::new(SpotifyPlaybackSource::new(
            client.clone(),
            spotify_cfg.player_url,
        ));
        let playback = Arc::new(PlaybackStateClient::new(tokens, source));

        // 注册取色策略，未启用的能力不注册
        let mut strategies: Vec<Arc<dyn ColorStrategy>> = vec![Arc::new(
            AlbumArtColorStrategy::new(
                Arc::new(HttpArtworkFetcher::new(client.clone())),
                Arc::new(VibrantPaletteExtractor::new(app_cfg.palette_max_dimension())),
            ),
        )];
        if app_cfg.lyrics_enabled() {
            strategies.push(Arc::new(LyricsColorStrategy::new(
                Arc::new(GeniusLyricsProvider::new(client.clone(), app_cfg.genius())),
                Arc::new(OpenAiCompletionClient::new(client, app_cfg.openai())),
            )));
        } else {
            info!("Lyrics color strategy disabled");
        }

        Self {
            app_cfg,
            resolver: Arc::new(ColorResolver::new(playback, strategies)),
        }
    }
}
