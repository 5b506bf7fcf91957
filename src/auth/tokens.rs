//! # 随机令牌
//!
//! 会话令牌、密码重置令牌、邮箱验证令牌均为 256 位随机数的 hex 编码。
//! 重置与验证令牌在库中只保存 SHA-256 摘要。

use rand::RngCore;
use sha2::{Digest, Sha256};

/// 生成 32 字节随机令牌（64 个 hex 字符）
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// 令牌的 SHA-256 摘要（hex）
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
        assert_eq!(hash_token("abc").len(), 64);
    }
}
