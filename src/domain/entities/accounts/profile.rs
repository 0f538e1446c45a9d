//! Profile Entity
//!
//! 계정당 하나의 표시용 정보. 계정 생성(회원가입 / OAuth 프로비저닝)과 함께만 만들어집니다.

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// 소유 계정 id (계정당 1건이므로 그대로 키로 사용)
    #[serde(rename = "_id")]
    pub account_id: i64,
    pub nickname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub account_id: i64,
    pub nickname: String,
    pub avatar_url: Option<String>,
}

impl NewProfile {
    /// 빈 아바타 URL은 `None`으로 저장합니다.
    pub fn new(account_id: i64, nickname: &str, avatar_url: Option<&str>) -> Self {
        Self {
            account_id,
            nickname: nickname.trim().to_string(),
            avatar_url: avatar_url
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string),
        }
    }

    pub fn into_profile(self, now: DateTime) -> Profile {
        Profile {
            account_id: self.account_id,
            nickname: self.nickname,
            avatar_url: self.avatar_url,
            bio: None,
            created_at: now,
            updated_at: now,
        }
    }
}
