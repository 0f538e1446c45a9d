//! Identity Entity
//!
//! 계정과 인증 수단의 결합 한 건을 나타냅니다. 하나의 계정은 이메일 + Google 처럼
//! 여러 Identity를 가질 수 있으며, `(method, identifier)`가 사실상의 로그인 키입니다.

use std::fmt;

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::core::{AppError, AppResult};

/// 인증 수단
///
/// `Email`만 비밀번호 해시를 자격 증명으로 가지며,
/// 나머지는 외부 프로바이더가 신원을 보증하는 연합 인증입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityMethod {
    Email,
    Google,
    Apple,
}

impl IdentityMethod {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(IdentityMethod::Email),
            "google" => Ok(IdentityMethod::Google),
            "apple" => Ok(IdentityMethod::Apple),
            _ => Err(format!("Unsupported identity method: {}", s)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityMethod::Email => "email",
            IdentityMethod::Google => "google",
            IdentityMethod::Apple => "apple",
        }
    }

    pub fn is_federated(&self) -> bool {
        !matches!(self, IdentityMethod::Email)
    }
}

impl fmt::Display for IdentityMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "_id")]
    pub id: i64,
    pub account_id: i64,
    pub method: IdentityMethod,
    /// 이메일 주소 또는 프로바이더 측 식별자
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    credential: Option<String>,
    pub last_login_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Identity {
    /// 이메일 인증 수단의 비밀번호 해시
    ///
    /// 연합 인증 수단에는 항상 `None`입니다.
    pub fn password_hash(&self) -> Option<&str> {
        match self.method {
            IdentityMethod::Email => self.credential.as_deref(),
            _ => None,
        }
    }
}

/// 저장 전 Identity
///
/// 생성자를 통해서만 만들 수 있으므로 "자격 증명은 email 에만 존재한다"는
/// 불변식이 타입 수준에서 유지됩니다.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    account_id: i64,
    method: IdentityMethod,
    identifier: String,
    credential: Option<String>,
    last_login_at: Option<DateTime>,
}

impl NewIdentity {
    pub fn email(account_id: i64, email: &str, password_hash: String) -> Self {
        Self {
            account_id,
            method: IdentityMethod::Email,
            identifier: email.to_string(),
            credential: Some(password_hash),
            last_login_at: None,
        }
    }

    pub fn federated(
        account_id: i64,
        method: IdentityMethod,
        identifier: &str,
        last_login_at: Option<DateTime>,
    ) -> AppResult<Self> {
        if !method.is_federated() {
            return Err(AppError::ValidationError(
                "email identities must be created with a password".to_string(),
            ));
        }

        Ok(Self {
            account_id,
            method,
            identifier: identifier.to_string(),
            credential: None,
            last_login_at,
        })
    }

    pub fn method(&self) -> IdentityMethod {
        self.method
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn into_identity(self, id: i64, now: DateTime) -> Identity {
        Identity {
            id,
            account_id: self.account_id,
            method: self.method,
            identifier: self.identifier,
            credential: self.credential,
            last_login_at: self.last_login_at,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 이메일 식별자 정규화 (앞뒤 공백 제거, 소문자)
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
