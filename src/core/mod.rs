//! 애플리케이션 공통 기반 모듈
//!
//! 전역 에러 타입과 `AppResult` 별칭을 제공합니다.

pub mod errors;

pub use errors::*;
