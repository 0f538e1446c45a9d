//! 인증 API 요청 DTO
//!
//! `validator`로 형식 검증을 수행합니다. 비즈니스 검증(중복 이메일, 계정 상태 등)은
//! `IdentityService`의 책임입니다.
use serde::Deserialize;
use validator::Validate;

/// `POST /auth/register`
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50, message = "username must be 1-50 characters"))]
    pub username: String,

    #[validate(email(message = "email must be a valid address"))]
    pub email: String,

    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

/// `POST /auth/login`
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// `POST /auth/refresh`
///
/// 빈 토큰도 그대로 서비스에 전달되어 `invalid refresh token`(401)으로 거부됩니다.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

/// `GET /auth/verify?token=`
#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    #[serde(default)]
    pub token: String,
}

/// `GET /auth/login/google?redirect=`
#[derive(Debug, Deserialize)]
pub struct OAuthLoginQuery {
    pub redirect: Option<String>,
}

/// `GET /auth/callback/google?code=&state=`
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}
