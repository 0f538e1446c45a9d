//! Authentication HTTP Handlers
//!
//! 회원가입, 로그인, 토큰 갱신, Google OAuth, 이메일 인증 엔드포인트입니다.
//! 모든 비즈니스 로직은 `IdentityService`에 위임하며, 핸들러는 입력 검증과
//! 응답 형식 변환, 요청 데드라인만 담당합니다.
//!
//! # Endpoints
//!
//! | 메서드 | 경로 | 설명 |
//! |--------|------|------|
//! | POST | `/auth/register` | 이메일 회원가입 (201) |
//! | POST | `/auth/login` | 이메일 / 비밀번호 로그인 |
//! | POST | `/auth/refresh` | 리프레시 토큰 로테이션 |
//! | GET | `/auth/login/google` | Google 인증 페이지로 302 |
//! | GET | `/auth/callback/google` | Google 콜백, 프론트엔드로 302 |
//! | GET | `/auth/verify` | 이메일 인증, 프론트엔드로 302 |
//! | GET | `/auth/me` | 액세스 토큰 확인 (인증 필요) |
//! | POST | `/auth/forgot-password` | 미구현 (501) |
use std::future::Future;

use actix_web::{get, http::header, post, web, HttpRequest, HttpResponse};
use serde_json::json;
use validator::Validate;

use crate::config::ServerSettings;
use crate::core::{AppError, AppResult};
use crate::domain::dto::{
    LoginRequest, OAuthCallbackQuery, OAuthLoginQuery, RefreshRequest, RegisterRequest,
    RegisterResponse, TokenResponse, UserInfoResponse, VerifyEmailQuery,
};
use crate::domain::models::AuthenticatedUser;
use crate::middlewares::AuthMiddleware;
use crate::services::auth::OAuthProvider;
use crate::services::identity::IdentityService;

/// 서비스 호출을 요청 데드라인으로 감쌉니다.
///
/// 데드라인을 넘기면 future가 drop되어 열려 있던 트랜잭션도 롤백됩니다.
async fn with_deadline<T, F>(settings: &ServerSettings, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    tokio::time::timeout(settings.request_timeout, fut)
        .await
        .map_err(|_| {
            AppError::ServiceUnavailable(format!(
                "요청 처리 시간 초과 ({:?})",
                settings.request_timeout
            ))
        })?
}

/// 요청의 scheme/host와 API base path로 외부에서 접근 가능한 기준 URL을 만듭니다.
///
/// `X-Forwarded-Proto`, `Forwarded` 헤더가 있으면 그 값을 따릅니다.
fn request_base_url(req: &HttpRequest, settings: &ServerSettings) -> String {
    let conn = req.connection_info();
    format!("{}://{}{}", conn.scheme(), conn.host(), settings.api_base_path)
}

/// `scheme://host[:port]` 부분만 남깁니다.
fn origin_of(url: &str) -> Option<String> {
    let (scheme, rest) = url.split_once("://")?;
    let host = rest.split(['/', '?', '#']).next().filter(|h| !h.is_empty())?;
    Some(format!("{}://{}", scheme, host))
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// 회원가입 핸들러
///
/// # Endpoint
/// `POST /auth/register`
///
/// # Request Body
/// ```json
/// { "username": "alice", "email": "alice@example.com", "password": "hunter22" }
/// ```
///
/// # Response
/// - 201: `{ "message": "...", "user_id": 1 }`
/// - 400: `{ "error": "user already exists" }` 또는 검증 오류
#[post("/register")]
pub async fn register(
    req: HttpRequest,
    payload: web::Json<RegisterRequest>,
    identity_service: web::Data<IdentityService>,
    settings: web::Data<ServerSettings>,
) -> Result<HttpResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let base_url = request_base_url(&req, &settings);
    let account = with_deadline(
        &settings,
        identity_service.register(&payload.username, &payload.email, &payload.password, &base_url),
    )
    .await?;

    Ok(HttpResponse::Created().json(RegisterResponse {
        message: "User created successfully. Please check your email for the verification link."
            .to_string(),
        user_id: account.id,
    }))
}

/// 로컬 로그인 핸들러
///
/// # Endpoint
/// `POST /auth/login`
///
/// # Response
/// - 200: `{ "access_token": "...", "refresh_token": "...", "type": "Bearer" }`
/// - 401: 자격 증명 오류, 미인증 / 정지 계정
#[post("/login")]
pub async fn login(
    payload: web::Json<LoginRequest>,
    identity_service: web::Data<IdentityService>,
    settings: web::Data<ServerSettings>,
) -> Result<HttpResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let pair = with_deadline(
        &settings,
        identity_service.login(&payload.email, &payload.password),
    )
    .await
    .inspect_err(|e| log::info!("로그인 실패 - {}: {}", payload.email, e))?;

    Ok(HttpResponse::Ok().json(TokenResponse::from(pair)))
}

/// 리프레시 토큰 로테이션 핸들러
///
/// # Endpoint
/// `POST /auth/refresh`
#[post("/refresh")]
pub async fn refresh(
    payload: web::Json<RefreshRequest>,
    identity_service: web::Data<IdentityService>,
    settings: web::Data<ServerSettings>,
) -> Result<HttpResponse, AppError> {
    let pair = with_deadline(
        &settings,
        identity_service.refresh_access_token(&payload.refresh_token),
    )
    .await?;

    Ok(HttpResponse::Ok().json(TokenResponse::from(pair)))
}

/// Google OAuth 시작 핸들러
///
/// 인증 완료 후 돌아갈 프론트엔드 URL을 `state`에 담아 Google 인증 페이지로 보냅니다.
/// 리턴 URL 후보는 `redirect` 쿼리, 설정된 프론트엔드 URL, `Referer`/`Origin` 순이며
/// 허용되지 않은 origin이면 프론트엔드 URL로 대체됩니다.
///
/// # Endpoint
/// `GET /auth/login/google?redirect={url}`
#[get("/login/google")]
pub async fn google_login(
    req: HttpRequest,
    query: web::Query<OAuthLoginQuery>,
    settings: web::Data<ServerSettings>,
) -> Result<HttpResponse, AppError> {
    let provider = oauth_provider(&req)?;

    let candidate = query
        .redirect
        .clone()
        .or_else(|| settings.frontend_url.clone())
        .or_else(|| header_origin(&req, header::REFERER))
        .or_else(|| header_origin(&req, header::ORIGIN));
    let state = settings.resolve_return_url(candidate.as_deref());

    let callback_url = format!("{}/auth/callback/google", request_base_url(&req, &settings));
    let auth_url = provider.authorization_url(&callback_url, &state)?;

    log::debug!("Google OAuth 시작 - 리턴 URL: {}", state);
    Ok(redirect(&auth_url))
}

/// Google OAuth 콜백 핸들러
///
/// 성공하면 `{리턴 URL}/auth/callback?token={access_token}`으로,
/// 실패하면 `{프론트엔드 URL}/auth/callback?error={code}`로 리다이렉트합니다.
///
/// # Endpoint
/// `GET /auth/callback/google?code={code}&state={state}`
#[get("/callback/google")]
pub async fn google_callback(
    req: HttpRequest,
    query: web::Query<OAuthCallbackQuery>,
    identity_service: web::Data<IdentityService>,
    settings: web::Data<ServerSettings>,
) -> Result<HttpResponse, AppError> {
    let failure = |code: &str| {
        redirect(&format!(
            "{}/auth/callback?error={}",
            settings.frontend_url(),
            urlencoding::encode(code)
        ))
    };

    if let Some(error) = &query.error {
        log::warn!(
            "Google OAuth 에러: {} - {}",
            error,
            query.error_description.as_deref().unwrap_or_default()
        );
        return Ok(failure(error));
    }

    let Some(code) = query.code.as_deref().filter(|c| !c.is_empty()) else {
        return Ok(failure("missing_code"));
    };

    let provider = oauth_provider(&req)?;
    let return_url = settings.resolve_return_url(query.state.as_deref());
    let callback_url = format!("{}/auth/callback/google", request_base_url(&req, &settings));

    let result = with_deadline(&settings, async {
        let user = provider.exchange_code(code, &callback_url).await?;
        let avatar = Some(user.picture.as_str()).filter(|p| !p.is_empty());
        identity_service
            .login_or_register_oauth(&user.email, &user.name, provider.method(), avatar)
            .await
    })
    .await;

    match result {
        Ok(token) => Ok(redirect(&format!(
            "{}/auth/callback?token={}",
            return_url,
            urlencoding::encode(&token)
        ))),
        Err(AppError::AccountSuspended) => Ok(failure("account_suspended")),
        Err(e) => {
            log::error!("Google OAuth 로그인 처리 실패: {}", e);
            Ok(failure("oauth_failed"))
        }
    }
}

/// 이메일 인증 핸들러
///
/// # Endpoint
/// `GET /auth/verify?token={token}`
///
/// # Response
/// - 302: `{프론트엔드 URL}/auth/verified`
/// - 400: `{ "error": "invalid or expired verification token" }`
#[get("/verify")]
pub async fn verify_email(
    query: web::Query<VerifyEmailQuery>,
    identity_service: web::Data<IdentityService>,
    settings: web::Data<ServerSettings>,
) -> Result<HttpResponse, AppError> {
    with_deadline(&settings, identity_service.verify_email(&query.token))
        .await
        .inspect_err(|e| log::warn!("이메일 인증 실패: {}", e))?;

    Ok(redirect(&format!("{}/auth/verified", settings.frontend_url())))
}

/// 현재 액세스 토큰의 클레임 확인
///
/// # Endpoint
/// `GET /auth/me` (Bearer 토큰 필요)
#[get("/me", wrap = "AuthMiddleware::required()")]
pub async fn me(user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(UserInfoResponse::from(user)))
}

/// 비밀번호 재설정 (미구현)
#[post("/forgot-password")]
pub async fn forgot_password() -> HttpResponse {
    HttpResponse::NotImplemented().json(json!({
        "error": "password reset is not implemented"
    }))
}

fn oauth_provider(req: &HttpRequest) -> AppResult<web::Data<dyn OAuthProvider>> {
    req.app_data::<web::Data<dyn OAuthProvider>>()
        .cloned()
        .ok_or_else(|| AppError::InternalError("Google OAuth not configured".to_string()))
}

fn header_origin(req: &HttpRequest, name: header::HeaderName) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(origin_of)
}
