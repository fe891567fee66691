pub mod fetcher;
pub mod quantize;
pub mod vibrant;

pub use fetcher::HttpArtworkFetcher;
pub use vibrant::VibrantPaletteExtractor;
