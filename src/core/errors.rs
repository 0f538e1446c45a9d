//! # Application Error Handling System
//!
//! 인증/세션 서비스 전역에서 사용하는 통합 에러 타입입니다.
//! `thiserror`로 `Error` trait을 구현하고, `actix_web::ResponseError`를 구현하여
//! 핸들러가 `Result<HttpResponse, AppError>`를 반환하기만 하면
//! 일관된 `{"error": "..."}` JSON 응답으로 변환됩니다.
//!
//! ## 에러 분류
//!
//! ### 인프라 계층
//! - `DatabaseError`: 자격 증명 저장소(MongoDB) 오류
//! - `ExternalServiceError`: OAuth 프로바이더, SMTP 등 외부 호출 실패
//! - `ServiceUnavailable`: 요청 데드라인 초과
//! - `InternalError`: 예상하지 못한 시스템 오류
//!
//! ### 도메인 계층 (인증 흐름)
//! - `AlreadyExists`: 이미 등록된 이메일로 회원가입
//! - `InvalidCredentials`: 이메일 없음 / 비밀번호 불일치 (의도적으로 구분하지 않음)
//! - `EmailNotVerified`, `AccountSuspended`: 계정 상태로 인한 로그인 거부
//! - `InvalidRefreshToken`: 없음 / 만료 / 재사용 된 리프레시 토큰 (구분하지 않음)
//! - `InvalidToken`: 액세스 토큰 서명/알고리즘/만료 검증 실패
//! - `InvalidVerificationTicket`, `ExpiredVerificationTicket`: 이메일 인증 토큰 실패
//!
//! ## 상태 코드 매핑
//!
//! | 에러 | HTTP 상태 |
//! |------|-----------|
//! | `ValidationError`, `AlreadyExists`, `*VerificationTicket` | 400 |
//! | `AuthenticationError`, `InvalidCredentials`, `EmailNotVerified`, `AccountSuspended`, `InvalidRefreshToken`, `InvalidToken` | 401 |
//! | `AuthorizationError` | 403 |
//! | `NotFound` | 404 |
//! | `ConflictError` | 409 |
//! | `ExternalServiceError` | 502 |
//! | `ServiceUnavailable` | 503 |
//! | `DatabaseError`, `InternalError` | 500 |
//!
//! 5xx 응답에는 내부 상세 정보를 노출하지 않습니다. 상세 내용은 서버 로그에만 남깁니다.

use actix_web::http::StatusCode;
use thiserror::Error;

/// 애플리케이션 전역 에러 타입
///
/// 도메인 에러의 `Display` 문구는 그대로 클라이언트에 전달되므로
/// 계정 존재 여부를 유추할 수 있는 정보를 담지 않습니다.
///
/// # 에러 변환 패턴
///
/// ```rust,ignore
/// collection.find_one(filter).await
///     .map_err(|e| AppError::DatabaseError(e.to_string()))?;
///
/// store.find_identity(IdentityMethod::Email, &email).await?
///     .ok_or(AppError::InvalidCredentials)?;
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// 데이터베이스 관련 에러
    ///
    /// 연결 실패, 쿼리 오류, 트랜잭션 커밋 실패 등.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// 입력값 검증 실패
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 요청된 리소스가 존재하지 않음
    #[error("Not found: {0}")]
    NotFound(String),

    /// 저장소 수준의 유니크 제약 위반
    ///
    /// 서비스 계층에서 비즈니스 의미가 있는 경우 `AlreadyExists` 등으로 변환됩니다.
    #[error("Conflict error: {0}")]
    ConflictError(String),

    /// 요청 수준의 인증 실패 (Authorization 헤더 누락 등)
    #[error("{0}")]
    AuthenticationError(String),

    /// 권한 부족
    #[error("Authorization error: {0}")]
    AuthorizationError(String),

    /// 외부 서비스(OAuth 프로바이더, SMTP) 호출 실패
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 요청 처리 데드라인 초과
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// 예상하지 못한 시스템 오류
    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("user already exists")]
    AlreadyExists,

    /// 이메일 미존재와 비밀번호 불일치를 동일한 문구로 표현합니다.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("please verify your email before logging in")]
    EmailNotVerified,

    #[error("your account has been suspended")]
    AccountSuspended,

    /// 미존재, 만료, 폐기된 리프레시 토큰을 하나의 문구로 표현합니다.
    #[error("invalid refresh token")]
    InvalidRefreshToken,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("invalid or expired verification token")]
    InvalidVerificationTicket,

    #[error("verification token has expired")]
    ExpiredVerificationTicket,
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::AlreadyExists
            | AppError::InvalidVerificationTicket
            | AppError::ExpiredVerificationTicket => StatusCode::BAD_REQUEST,
            AppError::AuthenticationError(_)
            | AppError::InvalidCredentials
            | AppError::EmailNotVerified
            | AppError::AccountSuspended
            | AppError::InvalidRefreshToken
            | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::AuthorizationError(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ConflictError(_) => StatusCode::CONFLICT,
            AppError::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DatabaseError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// HTTP 에러 응답을 생성합니다.
    ///
    /// 모든 에러 응답은 `{"error": "..."}` 형식입니다.
    /// 5xx 계열은 원본 메시지를 로그로만 남기고 일반화된 문구를 반환합니다.
    fn error_response(&self) -> actix_web::HttpResponse {
        let status = self.status_code();

        let message = match self {
            AppError::DatabaseError(_) | AppError::InternalError(_) => {
                log::error!("요청 처리 중 내부 오류: {}", self);
                "internal server error".to_string()
            }
            AppError::ExternalServiceError(_) => {
                log::error!("외부 서비스 오류: {}", self);
                "upstream service unavailable".to_string()
            }
            AppError::ServiceUnavailable(_) => {
                log::warn!("{}", self);
                "request deadline exceeded".to_string()
            }
            _ => self.to_string(),
        };

        actix_web::HttpResponse::build(status).json(serde_json::json!({
            "error": message
        }))
    }
}

/// 편의성을 위한 Result 타입 별칭
pub type AppResult<T> = Result<T, AppError>;

/// 외부 라이브러리 에러를 `AppError::InternalError`로 변환하는 확장 trait
///
/// # 예제
///
/// ```rust,ignore
/// use crate::core::errors::ErrorContext;
///
/// let params = Params::new(m_cost, t_cost, p_cost, None)
///     .context("Argon2 파라미터 구성 실패")?;
/// ```
pub trait ErrorContext<T> {
    /// 컨텍스트 정보와 함께 에러를 변환합니다.
    fn context(self, msg: &str) -> AppResult<T>;

    /// 지연 평가되는 컨텍스트 정보와 함께 에러를 변환합니다.
    fn with_context<F>(self, f: F) -> AppResult<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn context(self, msg: &str) -> AppResult<T> {
        self.map_err(|e| AppError::InternalError(format!("{}: {}", msg, e)))
    }

    fn with_context<F>(self, f: F) -> AppResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::InternalError(format!("{}: {}", f(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::ResponseError;

    async fn body_json(error: AppError) -> serde_json::Value {
        let body = to_bytes(error.error_response().into_body()).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn test_validation_error_response() {
        let error = AppError::ValidationError("email is required".to_string());
        assert_eq!(error.error_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_registration_conflict_is_bad_request() {
        assert_eq!(
            AppError::AlreadyExists.error_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_login_failures_are_unauthorized() {
        for error in [
            AppError::InvalidCredentials,
            AppError::EmailNotVerified,
            AppError::AccountSuspended,
            AppError::InvalidRefreshToken,
            AppError::InvalidToken,
        ] {
            assert_eq!(error.error_response().status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_verification_ticket_errors_are_bad_request() {
        assert_eq!(
            AppError::InvalidVerificationTicket.error_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::ExpiredVerificationTicket.error_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[actix_web::test]
    async fn test_domain_error_body_is_flat_message() {
        let body = body_json(AppError::InvalidCredentials).await;
        assert_eq!(body, serde_json::json!({ "error": "invalid credentials" }));
    }

    #[actix_web::test]
    async fn test_internal_error_hides_details() {
        let body = body_json(AppError::DatabaseError("connection refused at 10.0.0.3".into())).await;
        assert_eq!(body["error"], "internal server error");
    }

    #[test]
    fn test_error_context_trait() {
        let result: Result<(), &str> = Err("original error");
        let app_result = result.context("Additional context");

        if let Err(AppError::InternalError(msg)) = app_result {
            assert!(msg.contains("Additional context"));
            assert!(msg.contains("original error"));
        } else {
            panic!("Expected InternalError");
        }
    }
}
