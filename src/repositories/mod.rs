pub mod token;

pub use token::{InMemoryTokenStore, RefreshTokenStore};
