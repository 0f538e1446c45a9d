//! # Repository Layer
//!
//! 자격 증명 저장소 추상화(`CredentialStore`)와 구현체를 제공합니다.

pub mod credentials;

pub use credentials::*;
