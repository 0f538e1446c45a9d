//! # Google OAuth 2.0 인증 서비스
//!
//! Google OAuth 2.0 Authorization Code Flow의 프로바이더 측 호출을 담당합니다.
//! 계정 생성/로그인은 `IdentityService::login_or_register_oauth`가 처리하며,
//! 이 서비스는 코드 교환과 사용자 정보 조회까지만 수행합니다.
//!
//! ## OAuth 2.0 Authorization Code Flow
//!
//! ```text
//! ┌──────────┐             ┌──────────────┐               ┌──────────────┐
//! │ 브라우저  │             │  우리 서버    │               │ Google OAuth │
//! └──────────┘             └──────────────┘               └──────────────┘
//!      │ GET /auth/login/google    │                              │
//!      ├──────────────────────────►│                              │
//!      │ 302 (state = 리턴 URL)     │                              │
//!      │◄──────────────────────────┤                              │
//!      │ 사용자 인증                │                              │
//!      ├─────────────────────────────────────────────────────────►│
//!      │ GET /auth/callback/google?code&state                     │
//!      ├──────────────────────────►│ code → access_token          │
//!      │                           ├─────────────────────────────►│
//!      │                           │ access_token → userinfo      │
//!      │                           ├─────────────────────────────►│
//!      │ 302 {리턴 URL}/auth/callback?token=...                    │
//!      │◄──────────────────────────┤                              │
//! ```
//!
//! ## 사용하는 Google API 엔드포인트
//!
//! | 용도 | 엔드포인트 | 메서드 |
//! |------|------------|--------|
//! | **Authorization** | `https://accounts.google.com/o/oauth2/auth` | GET |
//! | **Token Exchange** | `https://oauth2.googleapis.com/token` | POST |
//! | **User Info** | `https://www.googleapis.com/oauth2/v2/userinfo` | GET |
//!
//! 요청 스코프는 `openid email profile`입니다.

use async_trait::async_trait;

use crate::config::GoogleOAuthConfig;
use crate::core::{AppError, AppResult};
use crate::domain::entities::IdentityMethod;
use crate::domain::models::oauth::google_oauth_model::{GoogleTokenResponse, GoogleUserInfo};
use crate::domain::models::ProviderUser;
use crate::services::auth::OAuthProvider;

const SCOPE: &str = "openid email profile";

/// Google OAuth 2.0 프로바이더
///
/// `reqwest::Client`는 내부적으로 커넥션 풀을 공유하므로
/// 서비스 생성 시 한 번 만들어 재사용합니다.
///
/// ## 설정 의존성
///
/// ```bash
/// GOOGLE_CLIENT_ID=your-client-id.apps.googleusercontent.com
/// GOOGLE_CLIENT_SECRET=your-client-secret
/// ```
///
/// ## 사용 예제
///
/// ```rust,ignore
/// let google = GoogleAuthService::from_env().expect("Google OAuth 미설정");
///
/// let url = google.authorization_url(&callback_url, &state)?;
/// let user = google.exchange_code(&code, &callback_url).await?;
/// ```
#[derive(Clone)]
pub struct GoogleAuthService {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    auth_uri: String,
    token_uri: String,
    userinfo_uri: String,
}

impl GoogleAuthService {
    pub fn new(
        client_id: String,
        client_secret: String,
        auth_uri: String,
        token_uri: String,
        userinfo_uri: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id,
            client_secret,
            auth_uri,
            token_uri,
            userinfo_uri,
        }
    }

    /// 환경 변수로 생성합니다.
    ///
    /// `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET` 중 하나라도 없으면 `None`이며,
    /// 이 경우 Google 로그인 라우트는 비활성화됩니다.
    pub fn from_env() -> Option<Self> {
        let client_id = GoogleOAuthConfig::client_id()?;
        let client_secret = GoogleOAuthConfig::client_secret()?;

        Some(Self::new(
            client_id,
            client_secret,
            GoogleOAuthConfig::auth_uri(),
            GoogleOAuthConfig::token_uri(),
            GoogleOAuthConfig::userinfo_uri(),
        ))
    }

    /// Authorization Code를 Google 액세스 토큰으로 교환
    async fn exchange_code_for_token(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> AppResult<GoogleTokenResponse> {
        let params = [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .client
            .post(&self.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Google 토큰 요청 실패: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalServiceError(format!(
                "Google 토큰 교환 실패 ({}): {}",
                status, error_text
            )));
        }

        response
            .json::<GoogleTokenResponse>()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Google 토큰 응답 파싱 실패: {}", e)))
    }

    /// Google 액세스 토큰으로 사용자 프로필 조회
    async fn get_user_info(&self, access_token: &str) -> AppResult<GoogleUserInfo> {
        let response = self
            .client
            .get(&self.userinfo_uri)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("Google 사용자 정보 요청 실패: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Google 사용자 정보 조회 실패: {}",
                response.status()
            )));
        }

        response
            .json::<GoogleUserInfo>()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Google 사용자 정보 파싱 실패: {}", e)))
    }
}

#[async_trait]
impl OAuthProvider for GoogleAuthService {
    fn method(&self) -> IdentityMethod {
        IdentityMethod::Google
    }

    fn authorization_url(&self, redirect_uri: &str, state: &str) -> AppResult<String> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("scope", SCOPE),
            ("response_type", "code"),
            ("state", state),
        ];

        let query_string = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        Ok(format!("{}?{}", self.auth_uri, query_string))
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> AppResult<ProviderUser> {
        if code.trim().is_empty() {
            return Err(AppError::ValidationError("authorization code is required".to_string()));
        }

        let token = self.exchange_code_for_token(code, redirect_uri).await?;
        let user = ProviderUser::try_from(self.get_user_info(&token.access_token).await?)?;

        log::info!(
            "Google 사용자 정보 조회 완료: sub={}, email={}",
            user.subject,
            user.email
        );
        Ok(user)
    }
}
