//! 리프레시 토큰 생성기
//!
//! 256비트 난수 시크릿을 만들어 클라이언트에 전달하고, 저장소에는
//! SHA-256 해시(16진수 문자열)만 남깁니다. 조회도 해시로만 수행됩니다.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Duration;
use mongodb::bson::DateTime;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::domain::entities::add_duration;

const SECRET_BYTES: usize = 32;
const DEFAULT_TTL_HOURS: i64 = 7 * 24;

#[derive(Debug, Clone)]
pub struct RefreshTokenManager {
    ttl: Duration,
}

impl RefreshTokenManager {
    /// `ttl_hours`가 0 이하이면 7일을 사용합니다.
    pub fn new(ttl_hours: i64) -> Self {
        let hours = if ttl_hours > 0 { ttl_hours } else { DEFAULT_TTL_HOURS };
        Self {
            ttl: Duration::hours(hours),
        }
    }

    /// 새 시크릿과 그 해시를 생성합니다.
    ///
    /// 반환값은 `(평문 시크릿, 저장용 해시)`입니다.
    pub fn generate(&self) -> (String, String) {
        let mut bytes = [0u8; SECRET_BYTES];
        OsRng.fill_bytes(&mut bytes);

        let secret = URL_SAFE_NO_PAD.encode(bytes);
        let hash = self.hash(&secret);
        (secret, hash)
    }

    pub fn hash(&self, secret: &str) -> String {
        format!("{:x}", Sha256::digest(secret.as_bytes()))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn expires_at(&self, now: DateTime) -> DateTime {
        add_duration(now, self.ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_returns_matching_hash() {
        let manager = RefreshTokenManager::new(1);
        let (secret, hash) = manager.generate();

        assert_eq!(secret.len(), 43);
        assert_eq!(hash.len(), 64);
        assert_eq!(manager.hash(&secret), hash);
    }

    #[test]
    fn test_hash_is_deterministic() {
        let manager = RefreshTokenManager::new(1);
        assert_eq!(manager.hash("abc"), manager.hash("abc"));
        assert_eq!(
            manager.hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_secrets_are_unique() {
        let manager = RefreshTokenManager::new(1);
        let (first, _) = manager.generate();
        let (second, _) = manager.generate();
        assert_ne!(first, second);
    }

    #[test]
    fn test_default_ttl_is_one_week() {
        assert_eq!(RefreshTokenManager::new(0).ttl(), Duration::hours(168));
        assert_eq!(RefreshTokenManager::new(-3).ttl(), Duration::hours(168));
        assert_eq!(RefreshTokenManager::new(12).ttl(), Duration::hours(12));
    }

    #[test]
    fn test_expires_at_adds_ttl() {
        let manager = RefreshTokenManager::new(2);
        let now = DateTime::from_millis(1_000_000);

        assert_eq!(
            manager.expires_at(now).timestamp_millis(),
            1_000_000 + 2 * 3600 * 1000
        );
    }
}
