/// 播放状态快照
///
/// 每次解析时实时获取，不做持久化。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackSnapshot {
    pub is_playing: bool,
    pub track_name: String,
    pub primary_artist: String,
    pub album_image_url: Option<String>,
}

impl PlaybackSnapshot {
    /// 当前没有任何播放
    pub fn idle() -> Self {
        Self::default()
    }
}
