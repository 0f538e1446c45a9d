//! # Authentication Configuration Module
//!
//! JWT 토큰, 리프레시 토큰, Google OAuth, SMTP, 프론트엔드 리다이렉트 등
//! 인증 흐름에 필요한 설정을 환경 변수에서 읽어옵니다.
//!
//! 설정 값은 프로세스 시작 시 `main`에서 한 번 읽어 각 서비스 생성자에 전달됩니다.
//! 서비스 내부에서 환경 변수를 직접 조회하지 않습니다.
//!
//! ## 필수 환경 변수 설정
//!
//! ### JWT 토큰 설정
//! ```bash
//! export JWT_SECRET="your-super-secret-jwt-key"
//! export JWT_EXPIRATION_HOURS="24"
//! export JWT_REFRESH_EXPIRATION_HOURS="168"
//! ```
//!
//! ### Google OAuth 설정
//! ```bash
//! export GOOGLE_CLIENT_ID="your-google-client-id"
//! export GOOGLE_CLIENT_SECRET="your-google-client-secret"
//! ```
//!
//! ### SMTP 설정 (비어 있으면 인증 링크를 로그로만 출력)
//! ```bash
//! export SMTP_HOST="smtp.example.com"
//! export SMTP_PORT="587"
//! export SMTP_USERNAME="mailer"
//! export SMTP_PASSWORD="secret"
//! export SMTP_FROM="no-reply@example.com"
//! export SMTP_USE_TLS="true"
//! ```
//!
//! ### 프론트엔드 설정
//! ```bash
//! export FRONTEND_URL="https://app.example.com"
//! export ALLOWED_REDIRECT_ORIGINS="https://admin.example.com,https://m.example.com"
//! ```

use std::env;

/// JWT 액세스 토큰 / 리프레시 토큰 설정
pub struct JwtConfig;

impl JwtConfig {
    pub fn secret() -> String {
        env::var("JWT_SECRET").unwrap_or_else(|_| {
            log::warn!("JWT_SECRET not set, using default (not secure for production!)");
            "your-secret-key".to_string()
        })
    }

    /// 액세스 토큰 유효 시간 (시간 단위, 기본 24)
    pub fn expiration_hours() -> i64 {
        env::var("JWT_EXPIRATION_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .unwrap_or(24)
    }

    /// 리프레시 토큰 유효 시간 (시간 단위)
    ///
    /// 설정되지 않았거나 파싱할 수 없으면 0을 반환하며,
    /// `RefreshTokenManager`가 0 이하 값을 7일로 보정합니다.
    pub fn refresh_expiration_hours() -> i64 {
        env::var("JWT_REFRESH_EXPIRATION_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }
}

/// Google OAuth 2.0 설정
pub struct GoogleOAuthConfig;

impl GoogleOAuthConfig {
    pub fn client_id() -> Option<String> {
        non_empty_var("GOOGLE_CLIENT_ID")
    }

    pub fn client_secret() -> Option<String> {
        non_empty_var("GOOGLE_CLIENT_SECRET")
    }

    pub fn auth_uri() -> String {
        env::var("GOOGLE_AUTH_URI")
            .unwrap_or_else(|_| "https://accounts.google.com/o/oauth2/auth".to_string())
    }

    pub fn token_uri() -> String {
        env::var("GOOGLE_TOKEN_URI")
            .unwrap_or_else(|_| "https://oauth2.googleapis.com/token".to_string())
    }

    pub fn userinfo_uri() -> String {
        env::var("GOOGLE_USERINFO_URI")
            .unwrap_or_else(|_| "https://www.googleapis.com/oauth2/v2/userinfo".to_string())
    }
}

/// SMTP 발송 설정
///
/// `host`가 비어 있으면 메일 발송 대신 인증 링크를 로그로 남깁니다.
#[derive(Debug, Clone, Default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub use_tls: bool,
}

impl SmtpConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("SMTP_HOST").unwrap_or_default(),
            port: env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(587),
            username: non_empty_var("SMTP_USERNAME"),
            password: non_empty_var("SMTP_PASSWORD"),
            from: env::var("SMTP_FROM").unwrap_or_else(|_| "no-reply@localhost".to_string()),
            use_tls: env::var("SMTP_USE_TLS")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(true),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.host.trim().is_empty()
    }
}

/// 프론트엔드 리다이렉트 설정
pub struct FrontendConfig;

impl FrontendConfig {
    pub fn url() -> Option<String> {
        non_empty_var("FRONTEND_URL").map(|url| url.trim_end_matches('/').to_string())
    }

    /// OAuth 완료 후 리다이렉트를 허용할 추가 origin 목록
    pub fn allowed_redirect_origins() -> Vec<String> {
        env::var("ALLOWED_REDIRECT_ORIGINS")
            .map(|v| parse_origin_list(&v))
            .unwrap_or_default()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
