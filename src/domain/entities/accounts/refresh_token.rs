//! Refresh Token Record Entity
//!
//! 발급된 리프레시 토큰 한 건. 평문 시크릿은 저장하지 않고 SHA-256 해시만 저장합니다.
//! 로테이션 시 폐기(`revoked_at`)될 뿐 삭제되지 않습니다.

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    #[serde(rename = "_id")]
    pub id: i64,
    pub account_id: i64,
    pub token_hash: String,
    pub expires_at: DateTime,
    pub revoked_at: Option<DateTime>,
    pub last_used_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl RefreshTokenRecord {
    /// `revoked_at IS NULL AND now < expires_at`
    pub fn is_usable(&self, now: DateTime) -> bool {
        self.revoked_at.is_none() && now < self.expires_at
    }

    /// 로테이션 시점에 폐기 표시를 합니다.
    pub fn revoke(&mut self, at: DateTime) {
        self.revoked_at = Some(at);
        self.last_used_at = Some(at);
        self.updated_at = at;
    }
}

#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub account_id: i64,
    pub token_hash: String,
    pub expires_at: DateTime,
}

impl NewRefreshToken {
    pub fn into_record(self, id: i64, now: DateTime) -> RefreshTokenRecord {
        RefreshTokenRecord {
            id,
            account_id: self.account_id,
            token_hash: self.token_hash,
            expires_at: self.expires_at,
            revoked_at: None,
            last_used_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
