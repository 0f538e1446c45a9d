//! # Domain Layer
//!
//! - `entities`: 자격 증명 저장소에 영속되는 엔티티
//! - `models`: 토큰 클레임, 인증된 사용자 등 요청 처리 중 사용하는 모델
//! - `dto`: HTTP 요청/응답 데이터
//!
//! 각 하위 모듈이 자신의 타입을 re-export하므로 `crate::domain::entities::Account`처럼
//! 하위 모듈 경로로 가져옵니다.

pub mod entities;
pub mod dto;
pub mod models;
