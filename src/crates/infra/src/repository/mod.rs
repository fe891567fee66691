pub mod in_memory;
pub mod persistent;

pub use self::in_memory::InMemoryTokenRepository;
pub use self::persistent::SledTokenRepository;
