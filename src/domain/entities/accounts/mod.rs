//! 계정 / 인증 수단 / 세션 관련 영속 엔티티
//!
//! 모든 엔티티는 자격 증명 저장소가 소유하며, 생성 시점의 불변식은
//! `New*` 타입의 생성자에서 검증됩니다.

pub mod account;
pub mod identity;
pub mod profile;
pub mod refresh_token;
pub mod verification_ticket;

pub use account::*;
pub use identity::*;
pub use profile::*;
pub use refresh_token::*;
pub use verification_ticket::*;

use mongodb::bson::DateTime;

/// `at` 시점에 `duration`을 더한 시각
pub fn add_duration(at: DateTime, duration: chrono::Duration) -> DateTime {
    DateTime::from_millis(at.timestamp_millis().saturating_add(duration.num_milliseconds()))
}
