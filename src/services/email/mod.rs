//! 인증 메일 발송 모듈
//!
//! 회원가입 후 인증 링크 전달만 담당하며, 발송 실패는 호출 측에서 로그로만 처리됩니다.

pub mod email_service;

pub use email_service::*;
