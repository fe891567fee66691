/// 调用方共享密钥所在的请求头
pub const SECRET_KEY_HEADER: &str = "secret_key";

pub const TRACK_COLOR_PATH: &str = "/track-color";
