//! # Configuration Module
//!
//! 환경 변수 기반 설정을 제공합니다.
//!
//! - [`auth_config`]: JWT, Google OAuth, SMTP, 프론트엔드 리다이렉트
//! - [`data_config`]: 실행 환경, 비밀번호 해시 비용, 서버, 저장소

pub mod data_config;
pub mod auth_config;

pub use data_config::*;
pub use auth_config::*;
