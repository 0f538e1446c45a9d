//! 미들웨어 모듈
//!
//! ### 인증 미들웨어 (AuthMiddleware)
//! - Bearer 액세스 토큰 추출 및 검증
//! - 사용자 정보를 request extension에 저장
//! - 선택적/강제 인증 모드 지원
//!
//! ## 특정 라우트에만 적용
//! ```rust,ignore
//! #[get("/me", wrap = "AuthMiddleware::required()")]
//! async fn me(user: AuthenticatedUser) -> Result<HttpResponse, AppError> { ... }
//! ```
//!
//! ## 스코프에 적용
//! ```rust,ignore
//! App::new()
//!     .app_data(web::Data::new(token_service))
//!     .service(
//!         web::scope("/api/protected")
//!             .wrap(AuthMiddleware::required())
//!             .route("/profile", web::get().to(get_profile))
//!     )
//! ```

pub mod auth_middleware;
mod auth_inner;

pub use auth_middleware::AuthMiddleware;
