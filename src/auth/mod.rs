//! Authentication primitives: password hashing and signed tokens.

pub mod password;
pub mod token;
