//! JWT 액세스 토큰 클레임 및 토큰 쌍
//!
//! RFC 7519 표준 클레임(`sub`, `iat`, `exp`)과 애플리케이션 클레임
//! (`email`, `identity_type`, `role`)으로 구성됩니다.
use serde::{Deserialize, Serialize};

use crate::core::{AppError, AppResult};
use crate::domain::entities::{IdentityMethod, Role};

/// 액세스 토큰의 클레임(Payload)
///
/// - `sub`: 계정 id (문자열)
/// - `email`: 로그인에 사용된 Identity의 식별자
/// - `identity_type`: 로그인에 사용된 인증 수단
/// - `role`: 계정 역할
/// - `iat` / `exp`: 발급 / 만료 시각 (Unix timestamp)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub email: String,
    pub identity_type: IdentityMethod,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl AccessClaims {
    pub fn account_id(&self) -> AppResult<i64> {
        self.sub.parse().map_err(|_| AppError::InvalidToken)
    }
}

/// 로그인 / 토큰 갱신 결과로 클라이언트에 전달되는 토큰 쌍
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    /// 평문 리프레시 시크릿 (저장소에는 해시만 존재)
    pub refresh_token: String,
}
