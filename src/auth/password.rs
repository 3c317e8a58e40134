//! Password hashing with bcrypt.

use crate::error::ApiResult;

const BCRYPT_COST: u32 = 10;

pub fn hash_password(plain: &str) -> ApiResult<String> {
    Ok(bcrypt::hash(plain, BCRYPT_COST)?)
}

pub fn verify_password(plain: &str, hashed: &str) -> ApiResult<bool> {
    Ok(bcrypt::verify(plain, hashed)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() {
        let hashed = hash_password("hunter42").unwrap();
        assert!(verify_password("hunter42", &hashed).unwrap());
        assert!(!verify_password("hunter43", &hashed).unwrap());
    }
}
