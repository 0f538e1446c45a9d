//! Account Entity
//!
//! 한 사람당 하나의 계정. 인증 수단(`Identity`)과 프로필은 계정 id로 연결됩니다.

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

/// 계정 역할
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// 계정 상태
///
/// 허용되는 전이는 `PendingVerification → Active`(이메일 인증),
/// `Active → Banned`(관리자 조치)뿐입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Banned,
    PendingVerification,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Banned => "banned",
            AccountStatus::PendingVerification => "pending_verification",
        }
    }

    pub fn can_transition_to(&self, next: AccountStatus) -> bool {
        matches!(
            (self, next),
            (AccountStatus::PendingVerification, AccountStatus::Active)
                | (AccountStatus::Active, AccountStatus::Banned)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: i64,
    pub role: Role,
    pub status: AccountStatus,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// 저장 전 계정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub role: Role,
    pub status: AccountStatus,
}

impl NewAccount {
    /// 이메일 가입 계정 (인증 대기 상태로 시작)
    pub fn pending_user() -> Self {
        Self {
            role: Role::User,
            status: AccountStatus::PendingVerification,
        }
    }

    /// OAuth 가입 계정 (프로바이더가 이메일을 검증했으므로 활성 상태로 시작)
    pub fn active_user() -> Self {
        Self {
            role: Role::User,
            status: AccountStatus::Active,
        }
    }

    pub fn into_account(self, id: i64, now: DateTime) -> Account {
        Account {
            id,
            role: self.role,
            status: self.status,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions_only_move_forward() {
        use AccountStatus::*;

        assert!(PendingVerification.can_transition_to(Active));
        assert!(Active.can_transition_to(Banned));

        assert!(!Active.can_transition_to(PendingVerification));
        assert!(!Banned.can_transition_to(Active));
        assert!(!PendingVerification.can_transition_to(Banned));
    }

    #[test]
    fn test_status_serializes_as_snake_case() {
        let json = serde_json::to_string(&AccountStatus::PendingVerification).unwrap();
        assert_eq!(json, "\"pending_verification\"");
        assert_eq!(AccountStatus::PendingVerification.as_str(), "pending_verification");
    }

    #[test]
    fn test_new_account_defaults() {
        assert_eq!(NewAccount::pending_user().status, AccountStatus::PendingVerification);
        assert_eq!(NewAccount::active_user().status, AccountStatus::Active);
        assert_eq!(NewAccount::active_user().role, Role::User);
    }
}
