//! 비즈니스 로직을 담당하는 서비스 계층 모듈
//!
//! 서비스는 `main`에서 한 번 생성되어 `web::Data`로 핸들러에 주입됩니다.
//!
//! - [`auth`]: 비밀번호 해시, JWT, 리프레시 토큰, OAuth 프로바이더
//! - [`email`]: 인증 메일 발송
//! - [`identity`]: 회원가입 / 로그인 / 토큰 갱신 흐름
//!
//! # Examples
//!
//! ```rust,ignore
//! use crate::services::identity::IdentityService;
//!
//! let pair = identity_service.login("alice@example.com", "hunter22").await?;
//! ```

pub mod auth;
pub mod email;
pub mod identity;
