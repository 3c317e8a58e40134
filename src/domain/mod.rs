//! Pure domain logic: document engines and the access gate, free of IO.

pub mod access;
pub mod cart;
pub mod wishlist;
