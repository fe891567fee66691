pub mod color;
pub mod playback;
pub mod token;
