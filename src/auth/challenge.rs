//! # 双因素登录挑战
//!
//! 密码校验通过但用户启用了双因素认证时，签发一个短期挑战令牌
//! `"{user_id}.{expires_unix}.{hmac_hex}"`，第二步提交验证码时凭此换取会话。
//! 令牌无状态，签名密钥来自配置，未配置时进程启动时随机生成。

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// 挑战令牌签发器
#[derive(Clone)]
pub struct ChallengeSigner {
    key: Vec<u8>,
    ttl_secs: i64,
}

impl ChallengeSigner {
    #[must_use]
    pub fn new(secret: Option<&str>, ttl_secs: i64) -> Self {
        let key = secret.filter(|s| !s.is_empty()).map_or_else(
            || {
                let mut bytes = vec![0u8; 32];
                rand::thread_rng().fill_bytes(&mut bytes);
                bytes
            },
            |s| s.as_bytes().to_vec(),
        );
        Self { key, ttl_secs }
    }

    fn mac(&self, message: &str) -> Result<HmacSha256, AuthError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).map_err(|_| AuthError::ChallengeInvalid)?;
        mac.update(message.as_bytes());
        Ok(mac)
    }

    /// 签发挑战令牌
    pub fn issue(&self, user_id: i32, now_unix: i64) -> Result<String, AuthError> {
        let message = format!("{user_id}.{}", now_unix + self.ttl_secs);
        let signature = hex::encode(self.mac(&message)?.finalize().into_bytes());
        Ok(format!("{message}.{signature}"))
    }

    /// 校验挑战令牌，返回用户 ID
    pub fn verify(&self, token: &str, now_unix: i64) -> Result<i32, AuthError> {
        let mut parts = token.trim().splitn(3, '.');
        let (Some(user_id), Some(expires), Some(signature)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::ChallengeInvalid);
        };

        let signature = hex::decode(signature).map_err(|_| AuthError::ChallengeInvalid)?;
        self.mac(&format!("{user_id}.{expires}"))?
            .verify_slice(&signature)
            .map_err(|_| AuthError::ChallengeInvalid)?;

        let expires: i64 = expires.parse().map_err(|_| AuthError::ChallengeInvalid)?;
        if expires < now_unix {
            return Err(AuthError::ChallengeInvalid);
        }
        user_id.parse().map_err(|_| AuthError::ChallengeInvalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let signer = ChallengeSigner::new(Some("challenge-secret"), 300);
        let token = signer.issue(42, 1_000).unwrap();
        assert_eq!(signer.verify(&token, 1_200).unwrap(), 42);
    }

    #[test]
    fn test_expired_challenge() {
        let signer = ChallengeSigner::new(Some("challenge-secret"), 300);
        let token = signer.issue(42, 1_000).unwrap();
        assert!(matches!(signer.verify(&token, 1_301), Err(AuthError::ChallengeInvalid)));
    }

    #[test]
    fn test_tampered_challenge() {
        let signer = ChallengeSigner::new(Some("challenge-secret"), 300);
        let token = signer.issue(42, 1_000).unwrap();
        let forged = token.replacen("42.", "43.", 1);
        assert!(signer.verify(&forged, 1_000).is_err());
        assert!(signer.verify("garbage", 1_000).is_err());

        let other = ChallengeSigner::new(None, 300);
        assert!(other.verify(&token, 1_000).is_err());
    }
}
