//! Email Verification Ticket Entity
//!
//! 이메일 소유 확인용 1회용 토큰. 인증에 성공하면 삭제되고,
//! 만료된 티켓은 남아 있더라도 거부됩니다.

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::add_duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailVerificationTicket {
    #[serde(rename = "_id")]
    pub id: i64,
    pub account_id: i64,
    pub email: String,
    pub token: String,
    pub expires_at: DateTime,
    pub created_at: DateTime,
}

impl EmailVerificationTicket {
    pub fn is_expired(&self, now: DateTime) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct NewVerificationTicket {
    pub account_id: i64,
    pub email: String,
    pub token: String,
    pub expires_at: DateTime,
}

impl NewVerificationTicket {
    /// 랜덤 UUID 토큰과 `now + ttl` 만료 시각으로 티켓을 발급합니다.
    pub fn issue(account_id: i64, email: &str, ttl: chrono::Duration) -> Self {
        Self {
            account_id,
            email: email.to_string(),
            token: Uuid::new_v4().to_string(),
            expires_at: add_duration(DateTime::now(), ttl),
        }
    }

    pub fn into_ticket(self, id: i64, now: DateTime) -> EmailVerificationTicket {
        EmailVerificationTicket {
            id,
            account_id: self.account_id,
            email: self.email,
            token: self.token,
            expires_at: self.expires_at,
            created_at: now,
        }
    }
}
