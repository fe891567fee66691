pub mod token;

pub use token::SledTokenRepository;
