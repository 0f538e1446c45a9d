//! 계정 인증 / 세션 서비스 백엔드
//!
//! 이메일 인증을 거치는 회원가입, 비밀번호 로그인, Google OAuth 로그인(계정 자동 생성),
//! JWT 액세스 토큰 발급, 리프레시 토큰 로테이션을 제공합니다.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   HTTP Routes   │ ← REST API 엔드포인트
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │    Handlers     │ ← 요청 검증 / 응답 변환 / 데드라인
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ IdentityService │ ← 인증 흐름 (해시, 토큰, 메일)
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ CredentialStore │ ← 트랜잭션 단위 영속화
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ MongoDB / 메모리 │
//! └─────────────────┘
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use account_auth_service::services::identity::IdentityService;
//!
//! let account = identity_service
//!     .register("alice", "alice@example.com", "hunter22", "http://localhost:8080/api/v1")
//!     .await?;
//! let pair = identity_service.login("alice@example.com", "hunter22").await?;
//! ```

pub mod core;
pub mod config;
pub mod db;
pub mod domain;
pub mod repositories;
pub mod services;
pub mod routes;
pub mod handlers;
pub mod middlewares;
