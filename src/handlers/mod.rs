//! # HTTP Request Handlers Module
//!
//! HTTP 요청을 처리하는 핸들러 함수들을 정의하는 모듈입니다.
//!
//! ## 아키텍처 위치
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//!   Client (Browser, Mobile App, API Client)
//! └─────────────────────┬───────────────────────┘
//!                       │ HTTP Request/Response
//! ┌─────────────────────▼───────────────────────┐
//!   Handlers (이 모듈) - 입력 검증, 응답 변환       ← Web Layer
//! ├─────────────────────────────────────────────┤
//!   IdentityService - 인증 흐름                   ← Service Layer
//! ├─────────────────────────────────────────────┤
//!   CredentialStore - MongoDB / 인메모리          ← Repository Layer
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## 의존성 주입
//!
//! 서비스는 `main`에서 생성되어 `web::Data`로 등록되고, 핸들러 인자로 추출됩니다.
//!
//! ```rust,ignore
//! #[post("/login")]
//! pub async fn login(
//!     payload: web::Json<LoginRequest>,
//!     identity_service: web::Data<IdentityService>,
//!     settings: web::Data<ServerSettings>,
//! ) -> Result<HttpResponse, AppError> {
//!     payload.validate().map_err(|e| AppError::ValidationError(e.to_string()))?;
//!     let pair = identity_service.login(&payload.email, &payload.password).await?;
//!     Ok(HttpResponse::Ok().json(TokenResponse::from(pair)))
//! }
//! ```
//!
//! ## 에러 처리
//!
//! 핸들러는 `Result<HttpResponse, AppError>`를 반환하며, `AppError`가
//! `{"error": "..."}` 응답과 상태 코드로 변환됩니다.

pub mod auth;
