//! 계정 인증 흐름 모듈
//!
//! 회원가입, 로그인, OAuth, 이메일 인증, 토큰 갱신이 모두 [`IdentityService`]를 통과합니다.

pub mod identity_service;

pub use identity_service::*;

#[cfg(test)]
mod tests;
