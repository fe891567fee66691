use config::{Config, Environment, File};
use dotenvy::dotenv;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),
    #[error("missing required configuration: {0}")]
    MissingField(&'static str),
    #[error("invalid configuration value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawConfig {
    /// 调用方必须在 `secret_key` 请求头中携带的共享密钥
    secret_key: String,
    spotify: RawSpotifyConfig,
    genius: RawGeniusConfig,
    openai: RawOpenAiConfig,
    lyrics: RawLyricsConfig,
    palette: RawPaletteConfig,
    token_store: RawTokenStoreConfig,
    http: RawHttpConfig,
    server: RawServerConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawSpotifyConfig {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    auth_url: String,
    player_url: String,
}

impl Default for RawSpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            refresh_token: String::new(),
            auth_url: "https://accounts.spotify.com/api/token".to_string(),
            player_url: "https://api.spotify.com/v1/me/player".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawGeniusConfig {
    access_token: Option<String>,
    api_base_url: String,
}

impl Default for RawGeniusConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            api_base_url: "https://api.genius.com".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawOpenAiConfig {
    api_key: Option<String>,
    completion_url: String,
    model: String,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            completion_url: "https://api.openai.com/v1/completions".to_string(),
            model: "gpt-3.5-turbo-instruct".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawLyricsConfig {
    /// 关闭后歌词取色直接视为无结果
    enabled: bool,
}

impl Default for RawLyricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawPaletteConfig {
    /// 提取调色板前图片缩放到的最长边（像素）
    max_dimension: u32,
}

impl Default for RawPaletteConfig {
    fn default() -> Self {
        Self { max_dimension: 100 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawTokenStoreConfig {
    /// `sled` 或 `memory`
    backend: String,
    path: String,
}

impl Default for RawTokenStoreConfig {
    fn default() -> Self {
        Self {
            backend: "sled".to_string(),
            path: "./data/tokens".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawHttpConfig {
    /// 单次外部请求超时（秒）
    timeout_secs: u64,
}

impl Default for RawHttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

/// 服务器配置（原始配置）
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawServerConfig {
    /// 监听地址
    host: String,
    /// 监听端口
    port: u16,
}

impl Default for RawServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5533,
        }
    }
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            spotify: RawSpotifyConfig::default(),
            genius: RawGeniusConfig::default(),
            openai: RawOpenAiConfig::default(),
            lyrics: RawLyricsConfig::default(),
            palette: RawPaletteConfig::default(),
            token_store: RawTokenStoreConfig::default(),
            http: RawHttpConfig::default(),
            server: RawServerConfig::default(),
        }
    }
}

/// Spotify 账号与接口配置
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub auth_url: String,
    pub player_url: String,
}

/// Genius 歌词接口配置，未配置 token 时歌词取色报配置错误
#[derive(Debug, Clone)]
pub struct GeniusConfig {
    pub access_token: Option<String>,
    pub api_base_url: String,
}

/// OpenAI 补全接口配置
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub completion_url: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenStoreBackend {
    Sled,
    Memory,
}

#[derive(Debug, Clone)]
pub struct TokenStoreConfig {
    pub backend: TokenStoreBackend,
    pub path: PathBuf,
}

/// 服务器配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct AppConfigImpl {
    secret_key: String,
    spotify: SpotifyConfig,
    genius: GeniusConfig,
    openai: OpenAiConfig,
    lyrics_enabled: bool,
    palette_max_dimension: u32,
    token_store: TokenStoreConfig,
    http_timeout: Duration,
    server: ServerConfig,
}

fn required(value: String, name: &'static str) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::MissingField(name))
    } else {
        Ok(value)
    }
}

// 空字符串等同于未配置
fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl AppConfigImpl {
    fn new(data: RawConfig) -> Result<Self, ConfigError> {
        let spotify = SpotifyConfig {
            client_id: required(data.spotify.client_id, "spotify.client_id")?,
            client_secret: required(data.spotify.client_secret, "spotify.client_secret")?,
            refresh_token: required(data.spotify.refresh_token, "spotify.refresh_token")?,
            auth_url: data.spotify.auth_url,
            player_url: data.spotify.player_url,
        };
        let backend = match data.token_store.backend.to_lowercase().as_str() {
            "sled" => TokenStoreBackend::Sled,
            "memory" => TokenStoreBackend::Memory,
            other => {
                return Err(ConfigError::InvalidValue(
                    "token_store.backend",
                    other.to_string(),
                ))
            }
        };
        if data.palette.max_dimension == 0 {
            return Err(ConfigError::InvalidValue(
                "palette.max_dimension",
                "0".to_string(),
            ));
        }

        Ok(AppConfigImpl {
            secret_key: required(data.secret_key, "secret_key")?,
            spotify,
            genius: GeniusConfig {
                access_token: optional(data.genius.access_token),
                api_base_url: data.genius.api_base_url.trim_end_matches('/').to_string(),
            },
            openai: OpenAiConfig {
                api_key: optional(data.openai.api_key),
                completion_url: data.openai.completion_url,
                model: data.openai.model,
            },
            lyrics_enabled: data.lyrics.enabled,
            palette_max_dimension: data.palette.max_dimension,
            token_store: TokenStoreConfig {
                backend,
                path: PathBuf::from(data.token_store.path),
            },
            http_timeout: Duration::from_secs(data.http.timeout_secs.max(1)),
            server: ServerConfig {
                host: data.server.host,
                port: data.server.port,
            },
        })
    }

    /// 读取 `config.*` 文件与 `APP__` 前缀的环境变量（支持 `.env`）
    pub fn load() -> Result<AppConfigImpl, ConfigError> {
        dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<AppConfigImpl, ConfigError> {
        let raw: RawConfig = config.try_deserialize()?; // serde 自动填充默认值
        AppConfigImpl::new(raw)
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    pub fn spotify(&self) -> SpotifyConfig {
        self.spotify.clone()
    }

    pub fn genius(&self) -> GeniusConfig {
        self.genius.clone()
    }

    pub fn openai(&self) -> OpenAiConfig {
        self.openai.clone()
    }

    pub fn lyrics_enabled(&self) -> bool {
        self.lyrics_enabled
    }

    pub fn palette_max_dimension(&self) -> u32 {
        self.palette_max_dimension
    }

    pub fn token_store(&self) -> TokenStoreConfig {
        self.token_store.clone()
    }

    pub fn http_timeout(&self) -> Duration {
        self.http_timeout
    }

    pub fn server(&self) -> ServerConfig {
        self.server.clone()
    }
}
