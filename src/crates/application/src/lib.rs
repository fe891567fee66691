pub mod auth;
pub mod error;
pub mod playback;
pub mod resolver;
pub mod strategy;

#[cfg(test)]
mod test_support;
