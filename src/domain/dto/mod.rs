//! # Data Transfer Objects (DTO) Module
//!
//! 인증 API의 HTTP 요청/응답 구조를 정의합니다.

pub mod auth;

pub use auth::*;
