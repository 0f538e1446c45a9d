//! 인메모리 자격 증명 저장소
//!
//! 테스트와 로컬 개발(`CREDENTIAL_STORE=memory`)용 구현입니다.
//! 트랜잭션은 상태 전체에 대한 소유 잠금(`OwnedMutexGuard`)을 잡고 사본에 기록하며,
//! 커밋 시 사본으로 교체합니다. 트랜잭션이 직렬화되므로 동시 로테이션 경합에서
//! 항상 한 쪽만 조건부 폐기에 성공합니다.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::DateTime;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::core::{AppError, AppResult};
use crate::domain::entities::{
    Account, AccountStatus, EmailVerificationTicket, Identity, IdentityMethod, NewAccount,
    NewIdentity, NewProfile, NewRefreshToken, NewVerificationTicket, Profile, RefreshTokenRecord,
};
use crate::repositories::credentials::{CredentialStore, StoreTransaction};

#[derive(Debug, Default, Clone)]
struct MemoryState {
    last_id: i64,
    accounts: BTreeMap<i64, Account>,
    identities: BTreeMap<i64, Identity>,
    profiles: BTreeMap<i64, Profile>,
    tickets: BTreeMap<i64, EmailVerificationTicket>,
    refresh_tokens: BTreeMap<i64, RefreshTokenRecord>,
}

impl MemoryState {
    fn allocate_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 계정에 발급된 이메일 인증 티켓 목록
    pub async fn tickets_for_account(&self, account_id: i64) -> Vec<EmailVerificationTicket> {
        let state = self.state.lock().await;
        state
            .tickets
            .values()
            .filter(|t| t.account_id == account_id)
            .cloned()
            .collect()
    }

    /// 계정에 발급된 리프레시 토큰 레코드 목록 (폐기된 것 포함)
    pub async fn refresh_tokens_for_account(&self, account_id: i64) -> Vec<RefreshTokenRecord> {
        let state = self.state.lock().await;
        state
            .refresh_tokens
            .values()
            .filter(|r| r.account_id == account_id)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
impl MemoryCredentialStore {
    pub async fn set_account_status(&self, account_id: i64, status: AccountStatus) {
        let mut state = self.state.lock().await;
        if let Some(account) = state.accounts.get_mut(&account_id) {
            account.status = status;
        }
    }

    pub async fn identity_count(&self) -> usize {
        self.state.lock().await.identities.len()
    }

    pub async fn account_count(&self) -> usize {
        self.state.lock().await.accounts.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, staged }))
    }

    async fn find_identity(
        &self,
        method: IdentityMethod,
        identifier: &str,
    ) -> AppResult<Option<Identity>> {
        let state = self.state.lock().await;
        Ok(state
            .identities
            .values()
            .find(|i| i.method == method && i.identifier == identifier)
            .cloned())
    }

    async fn find_identity_by_account(
        &self,
        account_id: i64,
        method: IdentityMethod,
    ) -> AppResult<Option<Identity>> {
        let state = self.state.lock().await;
        Ok(state
            .identities
            .values()
            .find(|i| i.account_id == account_id && i.method == method)
            .cloned())
    }

    async fn find_account(&self, account_id: i64) -> AppResult<Option<Account>> {
        Ok(self.state.lock().await.accounts.get(&account_id).cloned())
    }

    async fn find_profile(&self, account_id: i64) -> AppResult<Option<Profile>> {
        Ok(self.state.lock().await.profiles.get(&account_id).cloned())
    }

    async fn find_ticket(&self, token: &str) -> AppResult<Option<EmailVerificationTicket>> {
        let state = self.state.lock().await;
        Ok(state.tickets.values().find(|t| t.token == token).cloned())
    }

    async fn find_active_refresh_token(
        &self,
        token_hash: &str,
    ) -> AppResult<Option<RefreshTokenRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .refresh_tokens
            .values()
            .find(|r| r.token_hash == token_hash && r.revoked_at.is_none())
            .cloned())
    }

    async fn activate_account(&self, account_id: i64) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        match state.accounts.get_mut(&account_id) {
            Some(account) if account.status.can_transition_to(AccountStatus::Active) => {
                account.status = AccountStatus::Active;
                account.updated_at = DateTime::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_ticket(&self, ticket_id: i64) -> AppResult<()> {
        self.state.lock().await.tickets.remove(&ticket_id);
        Ok(())
    }

    async fn record_login(&self, identity_id: i64, at: DateTime) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let identity = state
            .identities
            .get_mut(&identity_id)
            .ok_or_else(|| AppError::NotFound(format!("identity {}", identity_id)))?;
        identity.last_login_at = Some(at);
        identity.updated_at = at;
        Ok(())
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn insert_account(&mut self, account: NewAccount) -> AppResult<Account> {
        let id = self.staged.allocate_id();
        let account = account.into_account(id, DateTime::now());
        self.staged.accounts.insert(id, account.clone());
        Ok(account)
    }

    async fn insert_identity(&mut self, identity: NewIdentity) -> AppResult<Identity> {
        let duplicate = self
            .staged
            .identities
            .values()
            .any(|i| i.method == identity.method() && i.identifier == identity.identifier());
        if duplicate {
            return Err(AppError::ConflictError(format!(
                "identity ({}, {}) already exists",
                identity.method(),
                identity.identifier()
            )));
        }

        let id = self.staged.allocate_id();
        let identity = identity.into_identity(id, DateTime::now());
        self.staged.identities.insert(id, identity.clone());
        Ok(identity)
    }

    async fn insert_profile(&mut self, profile: NewProfile) -> AppResult<Profile> {
        if self.staged.profiles.contains_key(&profile.account_id) {
            return Err(AppError::ConflictError(format!(
                "profile for account {} already exists",
                profile.account_id
            )));
        }

        let profile = profile.into_profile(DateTime::now());
        self.staged.profiles.insert(profile.account_id, profile.clone());
        Ok(profile)
    }

    async fn insert_ticket(
        &mut self,
        ticket: NewVerificationTicket,
    ) -> AppResult<EmailVerificationTicket> {
        if self.staged.tickets.values().any(|t| t.token == ticket.token) {
            return Err(AppError::ConflictError("verification token collision".to_string()));
        }

        let id = self.staged.allocate_id();
        let ticket = ticket.into_ticket(id, DateTime::now());
        self.staged.tickets.insert(id, ticket.clone());
        Ok(ticket)
    }

    async fn insert_refresh_token(
        &mut self,
        token: NewRefreshToken,
    ) -> AppResult<RefreshTokenRecord> {
        if self
            .staged
            .refresh_tokens
            .values()
            .any(|r| r.token_hash == token.token_hash)
        {
            return Err(AppError::ConflictError("refresh token hash collision".to_string()));
        }

        let id = self.staged.allocate_id();
        let record = token.into_record(id, DateTime::now());
        self.staged.refresh_tokens.insert(id, record.clone());
        Ok(record)
    }

    async fn revoke_refresh_token(&mut self, record_id: i64, at: DateTime) -> AppResult<bool> {
        match self.staged.refresh_tokens.get_mut(&record_id) {
            Some(record) if record.revoked_at.is_none() => {
                record.revoke(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTransaction { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::add_duration;

    async fn seed_account(store: &MemoryCredentialStore, email: &str) -> (Account, Identity) {
        let mut tx = store.begin().await.unwrap();
        let account = tx.insert_account(NewAccount::pending_user()).await.unwrap();
        let identity = tx
            .insert_identity(NewIdentity::email(account.id, email, "hash".to_string()))
            .await
            .unwrap();
        tx.commit().await.unwrap();
        (account, identity)
    }

    #[actix_web::test]
    async fn test_committed_transaction_is_visible() {
        let store = MemoryCredentialStore::new();
        let (account, identity) = seed_account(&store, "a@x.com").await;

        let found = store
            .find_identity(IdentityMethod::Email, "a@x.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, identity.id);
        assert_eq!(found.account_id, account.id);
    }

    #[actix_web::test]
    async fn test_dropped_transaction_rolls_back() {
        let store = MemoryCredentialStore::new();

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_account(NewAccount::pending_user()).await.unwrap();
        }

        assert_eq!(store.account_count().await, 0);
    }

    #[actix_web::test]
    async fn test_duplicate_identity_is_conflict() {
        let store = MemoryCredentialStore::new();
        seed_account(&store, "a@x.com").await;

        let mut tx = store.begin().await.unwrap();
        let account = tx.insert_account(NewAccount::pending_user()).await.unwrap();
        let result = tx
            .insert_identity(NewIdentity::email(account.id, "a@x.com", "hash".to_string()))
            .await;

        assert!(matches!(result, Err(AppError::ConflictError(_))));
    }

    #[actix_web::test]
    async fn test_same_identifier_with_different_method_is_allowed() {
        let store = MemoryCredentialStore::new();
        let (account, _) = seed_account(&store, "a@x.com").await;

        let mut tx = store.begin().await.unwrap();
        let google = NewIdentity::federated(account.id, IdentityMethod::Google, "a@x.com", None)
            .unwrap();
        assert!(tx.insert_identity(google).await.is_ok());
    }

    #[actix_web::test]
    async fn test_activation_only_from_pending() {
        let store = MemoryCredentialStore::new();
        let (account, _) = seed_account(&store, "a@x.com").await;

        assert!(store.activate_account(account.id).await.unwrap());
        assert!(!store.activate_account(account.id).await.unwrap());

        store.set_account_status(account.id, AccountStatus::Banned).await;
        assert!(!store.activate_account(account.id).await.unwrap());
        let account = store.find_account(account.id).await.unwrap().unwrap();
        assert_eq!(account.status, AccountStatus::Banned);
    }

    #[actix_web::test]
    async fn test_conditional_revoke_succeeds_once() {
        let store = MemoryCredentialStore::new();
        let (account, _) = seed_account(&store, "a@x.com").await;

        let mut tx = store.begin().await.unwrap();
        let record = tx
            .insert_refresh_token(NewRefreshToken {
                account_id: account.id,
                token_hash: "h1".to_string(),
                expires_at: add_duration(DateTime::now(), chrono::Duration::hours(1)),
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut first = store.begin().await.unwrap();
        assert!(first.revoke_refresh_token(record.id, DateTime::now()).await.unwrap());
        first.commit().await.unwrap();

        let mut second = store.begin().await.unwrap();
        assert!(!second.revoke_refresh_token(record.id, DateTime::now()).await.unwrap());
        drop(second);

        assert!(store.find_active_refresh_token("h1").await.unwrap().is_none());
    }
}
