pub mod entities;

pub use entities::token::{Claims, IssuedToken, RefreshTokenRecord, TokenType};
