//! # 密码哈希

use crate::error::{AuthError, Result};

/// 密码最小长度
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// 校验密码强度
pub fn validate_password(password: &str) -> std::result::Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

/// 使用 bcrypt 哈希密码
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    Ok(bcrypt::hash(password, cost)?)
}

/// 校验密码；哈希格式异常视为不匹配
#[must_use]
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    bcrypt::verify(password, password_hash).unwrap_or_else(|e| {
        tracing::warn!("密码哈希校验异常: {}", e);
        false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse", 4).unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
    }

    #[test]
    fn test_min_length() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword { min: 8 })
        ));
        assert!(validate_password("longenough").is_ok());
    }
}
