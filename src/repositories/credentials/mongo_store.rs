//! # MongoDB 자격 증명 저장소
//!
//! 운영 환경용 `CredentialStore` 구현입니다.
//!
//! ## 컬렉션
//!
//! | 컬렉션 | 키 | 인덱스 |
//! |--------|----|--------|
//! | `accounts` | `_id` (i64) | - |
//! | `identities` | `_id` (i64) | `(method, identifier)` unique, `account_id` |
//! | `profiles` | `_id` = account_id | - |
//! | `email_verifications` | `_id` (i64) | `token` unique |
//! | `refresh_tokens` | `_id` (i64) | `token_hash` unique, `account_id` |
//! | `counters` | 시퀀스 이름 | - |
//!
//! 숫자 id는 `counters` 컬렉션의 `$inc`로 할당합니다. 관계형 DB의 시퀀스처럼
//! 트랜잭션 밖에서 할당되므로 롤백되어도 번호가 재사용되지 않습니다.
//!
//! ## 트랜잭션
//!
//! `ClientSession` 기반 다중 문서 트랜잭션을 사용하므로 레플리카셋이 필요합니다.
//! 세션이 커밋 없이 drop되면 서버 측에서 트랜잭션이 중단됩니다.
//! 같은 리프레시 토큰을 동시에 폐기하려는 두 트랜잭션 중 늦은 쪽은
//! WriteConflict(112)를 받으며, 이는 경합 패배(`false`)로 처리합니다.
//! 그 밖의 일시적 오류(네트워크, primary 교체 등)는 `DatabaseError`로 전파됩니다.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use mongodb::{
    bson::{doc, DateTime, Document},
    error::{ErrorKind, WriteFailure, UNKNOWN_TRANSACTION_COMMIT_RESULT},
    options::{IndexOptions, ReturnDocument},
    ClientSession, Collection, IndexModel,
};

use crate::core::{AppError, AppResult};
use crate::db::Database;
use crate::domain::entities::{
    Account, AccountStatus, EmailVerificationTicket, Identity, IdentityMethod, NewAccount,
    NewIdentity, NewProfile, NewRefreshToken, NewVerificationTicket, Profile, RefreshTokenRecord,
};
use crate::repositories::credentials::{CredentialStore, StoreTransaction};

const ACCOUNTS: &str = "accounts";
const IDENTITIES: &str = "identities";
const PROFILES: &str = "profiles";
const EMAIL_VERIFICATIONS: &str = "email_verifications";
const REFRESH_TOKENS: &str = "refresh_tokens";
const COUNTERS: &str = "counters";

const DUPLICATE_KEY: i32 = 11000;
const WRITE_CONFLICT: i32 = 112;
const MAX_COMMIT_ATTEMPTS: usize = 3;

pub struct MongoCredentialStore {
    db: Arc<Database>,
}

impl MongoCredentialStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.get_database().collection::<T>(name)
    }

    /// 유니크 제약 및 조회용 인덱스를 생성합니다. 이미 존재하면 아무 일도 하지 않습니다.
    pub async fn create_indexes(&self) -> AppResult<()> {
        let unique = || IndexOptions::builder().unique(true).build();

        self.collection::<Identity>(IDENTITIES)
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "method": 1, "identifier": 1 })
                    .options(unique())
                    .build(),
            )
            .await
            .map_err(store_error)?;

        self.collection::<Identity>(IDENTITIES)
            .create_index(IndexModel::builder().keys(doc! { "account_id": 1 }).build())
            .await
            .map_err(store_error)?;

        self.collection::<EmailVerificationTicket>(EMAIL_VERIFICATIONS)
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "token": 1 })
                    .options(unique())
                    .build(),
            )
            .await
            .map_err(store_error)?;

        self.collection::<RefreshTokenRecord>(REFRESH_TOKENS)
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "token_hash": 1 })
                    .options(unique())
                    .build(),
            )
            .await
            .map_err(store_error)?;

        self.collection::<RefreshTokenRecord>(REFRESH_TOKENS)
            .create_index(IndexModel::builder().keys(doc! { "account_id": 1 }).build())
            .await
            .map_err(store_error)?;

        info!("자격 증명 저장소 인덱스 준비 완료");
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MongoCredentialStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTransaction>> {
        let mut session = self.db.client().start_session().await.map_err(store_error)?;
        session.start_transaction().await.map_err(store_error)?;

        Ok(Box::new(MongoTransaction {
            database: self.db.get_database(),
            session,
        }))
    }

    async fn find_identity(
        &self,
        method: IdentityMethod,
        identifier: &str,
    ) -> AppResult<Option<Identity>> {
        self.collection::<Identity>(IDENTITIES)
            .find_one(doc! { "method": method.as_str(), "identifier": identifier })
            .await
            .map_err(store_error)
    }

    async fn find_identity_by_account(
        &self,
        account_id: i64,
        method: IdentityMethod,
    ) -> AppResult<Option<Identity>> {
        self.collection::<Identity>(IDENTITIES)
            .find_one(doc! { "account_id": account_id, "method": method.as_str() })
            .await
            .map_err(store_error)
    }

    async fn find_account(&self, account_id: i64) -> AppResult<Option<Account>> {
        self.collection::<Account>(ACCOUNTS)
            .find_one(doc! { "_id": account_id })
            .await
            .map_err(store_error)
    }

    async fn find_profile(&self, account_id: i64) -> AppResult<Option<Profile>> {
        self.collection::<Profile>(PROFILES)
            .find_one(doc! { "_id": account_id })
            .await
            .map_err(store_error)
    }

    async fn find_ticket(&self, token: &str) -> AppResult<Option<EmailVerificationTicket>> {
        self.collection::<EmailVerificationTicket>(EMAIL_VERIFICATIONS)
            .find_one(doc! { "token": token })
            .await
            .map_err(store_error)
    }

    async fn find_active_refresh_token(
        &self,
        token_hash: &str,
    ) -> AppResult<Option<RefreshTokenRecord>> {
        self.collection::<RefreshTokenRecord>(REFRESH_TOKENS)
            .find_one(doc! { "token_hash": token_hash, "revoked_at": null })
            .await
            .map_err(store_error)
    }

    async fn activate_account(&self, account_id: i64) -> AppResult<bool> {
        let result = self
            .collection::<Account>(ACCOUNTS)
            .update_one(
                doc! {
                    "_id": account_id,
                    "status": AccountStatus::PendingVerification.as_str(),
                },
                doc! {
                    "$set": {
                        "status": AccountStatus::Active.as_str(),
                        "updated_at": DateTime::now(),
                    }
                },
            )
            .await
            .map_err(store_error)?;

        Ok(result.modified_count == 1)
    }

    async fn delete_ticket(&self, ticket_id: i64) -> AppResult<()> {
        self.collection::<EmailVerificationTicket>(EMAIL_VERIFICATIONS)
            .delete_one(doc! { "_id": ticket_id })
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn record_login(&self, identity_id: i64, at: DateTime) -> AppResult<()> {
        let result = self
            .collection::<Identity>(IDENTITIES)
            .update_one(
                doc! { "_id": identity_id },
                doc! { "$set": { "last_login_at": at, "updated_at": at } },
            )
            .await
            .map_err(store_error)?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!("identity {}", identity_id)));
        }
        Ok(())
    }
}

struct MongoTransaction {
    database: mongodb::Database,
    session: ClientSession,
}

impl MongoTransaction {
    /// 시퀀스 번호를 할당합니다. 세션 밖에서 실행되어 롤백되지 않습니다.
    async fn next_id(&self, sequence: &str) -> AppResult<i64> {
        let counter = self
            .database
            .collection::<Document>(COUNTERS)
            .find_one_and_update(doc! { "_id": sequence }, doc! { "$inc": { "seq": 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(store_error)?;

        counter
            .and_then(|c| c.get_i64("seq").ok())
            .ok_or_else(|| AppError::DatabaseError(format!("시퀀스 할당 실패: {}", sequence)))
    }
}

#[async_trait]
impl StoreTransaction for MongoTransaction {
    async fn insert_account(&mut self, account: NewAccount) -> AppResult<Account> {
        let account = account.into_account(self.next_id(ACCOUNTS).await?, DateTime::now());

        self.database
            .collection::<Account>(ACCOUNTS)
            .insert_one(&account)
            .session(&mut self.session)
            .await
            .map_err(store_error)?;

        Ok(account)
    }

    async fn insert_identity(&mut self, identity: NewIdentity) -> AppResult<Identity> {
        let identity = identity.into_identity(self.next_id(IDENTITIES).await?, DateTime::now());

        self.database
            .collection::<Identity>(IDENTITIES)
            .insert_one(&identity)
            .session(&mut self.session)
            .await
            .map_err(store_error)?;

        Ok(identity)
    }

    async fn insert_profile(&mut self, profile: NewProfile) -> AppResult<Profile> {
        let profile = profile.into_profile(DateTime::now());

        self.database
            .collection::<Profile>(PROFILES)
            .insert_one(&profile)
            .session(&mut self.session)
            .await
            .map_err(store_error)?;

        Ok(profile)
    }

    async fn insert_ticket(
        &mut self,
        ticket: NewVerificationTicket,
    ) -> AppResult<EmailVerificationTicket> {
        let ticket = ticket.into_ticket(self.next_id(EMAIL_VERIFICATIONS).await?, DateTime::now());

        self.database
            .collection::<EmailVerificationTicket>(EMAIL_VERIFICATIONS)
            .insert_one(&ticket)
            .session(&mut self.session)
            .await
            .map_err(store_error)?;

        Ok(ticket)
    }

    async fn insert_refresh_token(
        &mut self,
        token: NewRefreshToken,
    ) -> AppResult<RefreshTokenRecord> {
        let record = token.into_record(self.next_id(REFRESH_TOKENS).await?, DateTime::now());

        self.database
            .collection::<RefreshTokenRecord>(REFRESH_TOKENS)
            .insert_one(&record)
            .session(&mut self.session)
            .await
            .map_err(store_error)?;

        Ok(record)
    }

    async fn revoke_refresh_token(&mut self, record_id: i64, at: DateTime) -> AppResult<bool> {
        let result = self
            .database
            .collection::<RefreshTokenRecord>(REFRESH_TOKENS)
            .update_one(
                doc! { "_id": record_id, "revoked_at": null },
                doc! {
                    "$set": {
                        "revoked_at": at,
                        "last_used_at": at,
                        "updated_at": at,
                    }
                },
            )
            .session(&mut self.session)
            .await;

        match result {
            Ok(update) => Ok(update.modified_count == 1),
            Err(e) if is_write_conflict(&e) => {
                debug!("리프레시 토큰 {} 폐기 경합 발생: {}", record_id, e);
                Ok(false)
            }
            Err(e) => Err(store_error(e)),
        }
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let mut this = *self;
        let mut attempt = 1;

        loop {
            match this.session.commit_transaction().await {
                Ok(()) => return Ok(()),
                Err(e)
                    if e.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT)
                        && attempt < MAX_COMMIT_ATTEMPTS =>
                {
                    warn!("트랜잭션 커밋 결과 불명확, 재시도 {}/{}: {}", attempt, MAX_COMMIT_ATTEMPTS, e);
                    attempt += 1;
                }
                Err(e) => return Err(store_error(e)),
            }
        }
    }
}

/// MongoDB 에러를 `AppError`로 변환합니다. 중복 키는 `ConflictError`입니다.
fn store_error(error: mongodb::error::Error) -> AppError {
    if is_duplicate_key(&error) {
        AppError::ConflictError(error.to_string())
    } else {
        AppError::DatabaseError(error.to_string())
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    server_code(error) == Some(DUPLICATE_KEY)
}

fn is_write_conflict(error: &mongodb::error::Error) -> bool {
    server_code(error) == Some(WRITE_CONFLICT)
}

fn server_code(error: &mongodb::error::Error) -> Option<i32> {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => Some(e.code),
        ErrorKind::Command(e) => Some(e.code),
        _ => None,
    }
}
