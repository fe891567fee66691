pub mod auth;
pub mod player;

pub use auth::SpotifyCredentialExchange;
pub use player::SpotifyPlaybackSource;
