//! # Credential Store
//!
//! 계정, 인증 수단, 프로필, 이메일 인증 티켓, 리프레시 토큰 레코드의 영속 계층입니다.
//!
//! ## 트랜잭션 모델
//!
//! 여러 쓰기가 함께 커밋되어야 하는 작업(회원가입, OAuth 프로비저닝, 토큰 발급,
//! 리프레시 토큰 로테이션)은 [`CredentialStore::begin`]으로 얻은
//! [`StoreTransaction`] 안에서 수행합니다.
//!
//! - `commit()`을 호출해야만 변경이 반영됩니다.
//! - 커밋하지 않고 drop하면 롤백됩니다. 요청 취소나 데드라인 초과로 future가
//!   drop되는 경우도 동일합니다.
//!
//! 단일 문서 갱신(계정 활성화, 마지막 로그인 시각, 티켓 삭제)은 그 자체로 원자적이므로
//! 트랜잭션 없이 저장소에서 직접 수행합니다.
//!
//! ## 조회 결과
//!
//! "없음"은 `Ok(None)`으로 표현되며, 도메인 에러로의 변환은 서비스 계층의 책임입니다.
//! 그 외의 저장소 오류는 `AppError::DatabaseError`로 전파됩니다.
//! 유니크 제약 위반은 `AppError::ConflictError`입니다.

use async_trait::async_trait;
use mongodb::bson::DateTime;

use crate::core::AppResult;
use crate::domain::entities::{
    Account, EmailVerificationTicket, Identity, IdentityMethod, NewAccount, NewIdentity,
    NewProfile, NewRefreshToken, NewVerificationTicket, Profile, RefreshTokenRecord,
};

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// 새 트랜잭션을 시작합니다.
    async fn begin(&self) -> AppResult<Box<dyn StoreTransaction>>;

    /// `(method, identifier)`로 인증 수단을 조회합니다.
    async fn find_identity(
        &self,
        method: IdentityMethod,
        identifier: &str,
    ) -> AppResult<Option<Identity>>;

    /// 계정이 가진 특정 방식의 인증 수단을 조회합니다.
    async fn find_identity_by_account(
        &self,
        account_id: i64,
        method: IdentityMethod,
    ) -> AppResult<Option<Identity>>;

    async fn find_account(&self, account_id: i64) -> AppResult<Option<Account>>;

    async fn find_profile(&self, account_id: i64) -> AppResult<Option<Profile>>;

    async fn find_ticket(&self, token: &str) -> AppResult<Option<EmailVerificationTicket>>;

    /// 해시로 폐기되지 않은(`revoked_at IS NULL`) 리프레시 토큰 레코드를 조회합니다.
    ///
    /// 만료 여부는 호출자가 확인합니다.
    async fn find_active_refresh_token(
        &self,
        token_hash: &str,
    ) -> AppResult<Option<RefreshTokenRecord>>;

    /// `pending_verification` 상태의 계정을 `active`로 전환합니다.
    ///
    /// 다른 상태의 계정은 변경하지 않으며 `false`를 반환합니다.
    async fn activate_account(&self, account_id: i64) -> AppResult<bool>;

    async fn delete_ticket(&self, ticket_id: i64) -> AppResult<()>;

    /// 인증 수단의 `last_login_at`을 갱신합니다.
    async fn record_login(&self, identity_id: i64, at: DateTime) -> AppResult<()>;
}

#[async_trait]
pub trait StoreTransaction: Send {
    async fn insert_account(&mut self, account: NewAccount) -> AppResult<Account>;

    /// `(method, identifier)` 중복 시 `ConflictError`
    async fn insert_identity(&mut self, identity: NewIdentity) -> AppResult<Identity>;

    async fn insert_profile(&mut self, profile: NewProfile) -> AppResult<Profile>;

    async fn insert_ticket(
        &mut self,
        ticket: NewVerificationTicket,
    ) -> AppResult<EmailVerificationTicket>;

    async fn insert_refresh_token(
        &mut self,
        token: NewRefreshToken,
    ) -> AppResult<RefreshTokenRecord>;

    /// `revoked_at IS NULL` 조건부로 레코드를 폐기합니다.
    ///
    /// 이 트랜잭션이 폐기에 성공했으면 `true`, 이미 폐기되었거나 동시 요청과의
    /// 경합에서 졌으면 `false`를 반환합니다. `false`인 경우 호출자는 트랜잭션을
    /// 커밋하지 않아야 합니다.
    async fn revoke_refresh_token(&mut self, record_id: i64, at: DateTime) -> AppResult<bool>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}
