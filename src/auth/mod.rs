//! Authentication primitives: credential hashing, tokens, bearer extraction

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod reset_code;

pub use jwt::{Claims, JwtService, TokenPair, TokenSubject, TokenType};
pub use middleware::{bearer_auth_middleware, extract_token, AuthContext};
pub use password::PasswordHasher;
pub use reset_code::ResetCode;
