pub mod config;
pub use config::{AppConfigImpl, ConfigError, ServerConfig, TokenStoreBackend};

pub mod http;

pub mod spotify;
pub use spotify::{SpotifyCredentialExchange, SpotifyPlaybackSource};

pub mod genius;
pub use genius::GeniusLyricsProvider;

pub mod openai;
pub use openai::OpenAiCompletionClient;

pub mod cover_art;
pub use cover_art::{HttpArtworkFetcher, VibrantPaletteExtractor};

pub mod repository;
pub use repository::{InMemoryTokenRepository, SledTokenRepository};
