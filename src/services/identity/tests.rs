use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Duration;
use mongodb::bson::DateTime;
use tokio::sync::Barrier;

use crate::config::PasswordCost;
use crate::core::{AppError, AppResult};
use crate::domain::entities::{
    add_duration, Account, AccountStatus, EmailVerificationTicket, Identity, IdentityMethod,
    NewRefreshToken, Profile, RefreshTokenRecord, Role,
};
use crate::repositories::credentials::{CredentialStore, MemoryCredentialStore, StoreTransaction};
use crate::services::auth::{PasswordHasher, RefreshTokenManager, TokenService};
use crate::services::email::EmailGateway;
use crate::services::identity::IdentityService;

const BASE_URL: &str = "http://localhost:8080/api/v1";
const SECRET: &str = "identity-service-test-secret";

#[derive(Default)]
struct RecordingGateway {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingGateway {
    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailGateway for RecordingGateway {
    async fn send_verification_email(&self, to: &str, url: &str) -> AppResult<()> {
        self.sent.lock().unwrap().push((to.to_string(), url.to_string()));
        Ok(())
    }
}

/// 메일 발송이 끝나기까지 오래 걸리는 게이트웨이
struct StalledGateway;

#[async_trait]
impl EmailGateway for StalledGateway {
    async fn send_verification_email(&self, _to: &str, _url: &str) -> AppResult<()> {
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        Ok(())
    }
}

struct FailingGateway;

#[async_trait]
impl EmailGateway for FailingGateway {
    async fn send_verification_email(&self, _to: &str, _url: &str) -> AppResult<()> {
        Err(AppError::ExternalServiceError("smtp down".to_string()))
    }
}

struct Fixture {
    store: MemoryCredentialStore,
    mail: Arc<RecordingGateway>,
    tokens: TokenService,
    service: IdentityService,
}

fn fast_hasher() -> PasswordHasher {
    PasswordHasher::new(PasswordCost {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}

fn fixture() -> Fixture {
    let store = MemoryCredentialStore::new();
    let mail = Arc::new(RecordingGateway::default());
    let tokens = TokenService::new(SECRET, 1);
    let service = IdentityService::new(
        Arc::new(store.clone()),
        fast_hasher(),
        tokens.clone(),
        RefreshTokenManager::new(0),
        mail.clone(),
    );

    Fixture {
        store,
        mail,
        tokens,
        service,
    }
}

/// 백그라운드 메일 발송 태스크가 `count`건을 보낼 때까지 기다립니다.
async fn wait_for_mail(mail: &RecordingGateway, count: usize) -> Vec<(String, String)> {
    for _ in 0..100 {
        let sent = mail.sent();
        if sent.len() >= count {
            return sent;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    mail.sent()
}

/// 가입 후 인증까지 마친 계정
async fn verified_user(f: &Fixture, email: &str, password: &str) -> i64 {
    let account = f.service.register("alice", email, password, BASE_URL).await.unwrap();
    let ticket = f.store.tickets_for_account(account.id).await.remove(0);
    f.service.verify_email(&ticket.token).await.unwrap();
    account.id
}

#[actix_web::test]
async fn test_register_creates_pending_account_and_sends_link() {
    let f = fixture();

    let account = f
        .service
        .register("alice", "Alice@X.com ", "hunter22", BASE_URL)
        .await
        .unwrap();
    assert_eq!(account.status, AccountStatus::PendingVerification);
    assert_eq!(account.role, Role::User);

    let identity = f
        .store
        .find_identity(IdentityMethod::Email, "alice@x.com")
        .await
        .unwrap()
        .expect("email identity");
    assert_eq!(identity.account_id, account.id);
    assert!(identity.password_hash().unwrap().starts_with("$argon2id$"));

    let profile = f.store.find_profile(account.id).await.unwrap().unwrap();
    assert_eq!(profile.nickname, "alice");

    let tickets = f.store.tickets_for_account(account.id).await;
    assert_eq!(tickets.len(), 1);

    let sent = wait_for_mail(&f.mail, 1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "alice@x.com");
    assert_eq!(
        sent[0].1,
        format!("{}/auth/verify?token={}", BASE_URL, tickets[0].token)
    );
}

#[actix_web::test]
async fn test_duplicate_registration_is_rejected() {
    let f = fixture();
    f.service.register("alice", "alice@x.com", "hunter22", BASE_URL).await.unwrap();

    let result = f
        .service
        .register("alice2", "ALICE@x.com", "other-pass", BASE_URL)
        .await;

    assert!(matches!(result, Err(AppError::AlreadyExists)));
    assert_eq!(f.store.account_count().await, 1);
}

#[actix_web::test]
async fn test_email_failure_does_not_fail_registration() {
    let store = MemoryCredentialStore::new();
    let service = IdentityService::new(
        Arc::new(store.clone()),
        fast_hasher(),
        TokenService::new(SECRET, 1),
        RefreshTokenManager::new(0),
        Arc::new(FailingGateway),
    );

    let account = service
        .register("bob", "bob@x.com", "hunter22", BASE_URL)
        .await
        .unwrap();

    let stored = store.find_account(account.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AccountStatus::PendingVerification);
}

#[actix_web::test]
async fn test_slow_mail_server_does_not_delay_registration() {
    let store = MemoryCredentialStore::new();
    let service = IdentityService::new(
        Arc::new(store.clone()),
        fast_hasher(),
        TokenService::new(SECRET, 1),
        RefreshTokenManager::new(0),
        Arc::new(StalledGateway),
    );

    let account = tokio::time::timeout(
        std::time::Duration::from_secs(2),
        service.register("bob", "bob@x.com", "hunter22", BASE_URL),
    )
    .await
    .expect("registration must not wait for mail delivery")
    .unwrap();

    assert!(store.find_account(account.id).await.unwrap().is_some());
}

#[actix_web::test]
async fn test_login_before_verification_is_rejected() {
    let f = fixture();
    f.service.register("alice", "alice@x.com", "hunter22", BASE_URL).await.unwrap();

    let result = f.service.login("alice@x.com", "hunter22").await;
    assert!(matches!(result, Err(AppError::EmailNotVerified)));
}

#[actix_web::test]
async fn test_verify_then_login_issues_pair() {
    let f = fixture();
    let account_id = verified_user(&f, "alice@x.com", "hunter22").await;

    let account = f.store.find_account(account_id).await.unwrap().unwrap();
    assert_eq!(account.status, AccountStatus::Active);
    assert!(f.store.tickets_for_account(account_id).await.is_empty());

    let pair = f.service.login("ALICE@x.com", "hunter22").await.unwrap();
    let claims = f.tokens.verify_token(&pair.access_token).unwrap();
    assert_eq!(claims.sub, account_id.to_string());
    assert_eq!(claims.email, "alice@x.com");
    assert_eq!(claims.identity_type, IdentityMethod::Email);
    assert_eq!(claims.role, Role::User);

    let records = f.store.refresh_tokens_for_account(account_id).await;
    assert_eq!(records.len(), 1);
    assert_ne!(records[0].token_hash, pair.refresh_token);

    let identity = f
        .store
        .find_identity(IdentityMethod::Email, "alice@x.com")
        .await
        .unwrap()
        .unwrap();
    assert!(identity.last_login_at.is_some());
}

#[actix_web::test]
async fn test_unknown_email_and_wrong_password_are_indistinguishable() {
    let f = fixture();
    verified_user(&f, "alice@x.com", "hunter22").await;

    let unknown = f.service.login("nobody@x.com", "hunter22").await.unwrap_err();
    let wrong = f.service.login("alice@x.com", "hunter23").await.unwrap_err();

    assert!(matches!(unknown, AppError::InvalidCredentials));
    assert!(matches!(wrong, AppError::InvalidCredentials));
    assert_eq!(unknown.to_string(), wrong.to_string());
}

#[actix_web::test]
async fn test_verification_ticket_is_single_use() {
    let f = fixture();
    let account = f.service.register("alice", "alice@x.com", "hunter22", BASE_URL).await.unwrap();
    let token = f.store.tickets_for_account(account.id).await.remove(0).token;

    f.service.verify_email(&token).await.unwrap();
    let again = f.service.verify_email(&token).await;

    assert!(matches!(again, Err(AppError::InvalidVerificationTicket)));
}

#[actix_web::test]
async fn test_unknown_verification_token() {
    let f = fixture();
    assert!(matches!(
        f.service.verify_email("no-such-token").await,
        Err(AppError::InvalidVerificationTicket)
    ));
    assert!(matches!(
        f.service.verify_email("").await,
        Err(AppError::InvalidVerificationTicket)
    ));
}

#[actix_web::test]
async fn test_expired_verification_ticket_is_rejected() {
    let f = fixture();
    let service = f.service.clone().with_verification_ttl(Duration::seconds(-1));

    let account = service.register("alice", "alice@x.com", "hunter22", BASE_URL).await.unwrap();
    let token = f.store.tickets_for_account(account.id).await.remove(0).token;

    let result = service.verify_email(&token).await;
    assert!(matches!(result, Err(AppError::ExpiredVerificationTicket)));

    let stored = f.store.find_account(account.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AccountStatus::PendingVerification);
}

#[actix_web::test]
async fn test_suspended_account_cannot_login_or_refresh() {
    let f = fixture();
    let account_id = verified_user(&f, "alice@x.com", "hunter22").await;
    let pair = f.service.login("alice@x.com", "hunter22").await.unwrap();

    f.store.set_account_status(account_id, AccountStatus::Banned).await;

    assert!(matches!(
        f.service.login("alice@x.com", "hunter22").await,
        Err(AppError::AccountSuspended)
    ));
    assert!(matches!(
        f.service.refresh_access_token(&pair.refresh_token).await,
        Err(AppError::AccountSuspended)
    ));
}

#[actix_web::test]
async fn test_refresh_rotates_and_rejects_replay() {
    let f = fixture();
    let account_id = verified_user(&f, "alice@x.com", "hunter22").await;
    let first = f.service.login("alice@x.com", "hunter22").await.unwrap();

    let second = f.service.refresh_access_token(&first.refresh_token).await.unwrap();
    assert_ne!(second.refresh_token, first.refresh_token);
    assert!(f.tokens.verify_token(&second.access_token).is_ok());

    let replay = f.service.refresh_access_token(&first.refresh_token).await;
    assert!(matches!(replay, Err(AppError::InvalidRefreshToken)));

    let third = f.service.refresh_access_token(&second.refresh_token).await;
    assert!(third.is_ok());

    let records = f.store.refresh_tokens_for_account(account_id).await;
    assert_eq!(records.len(), 3);
    let revoked: Vec<_> = records.iter().filter(|r| r.revoked_at.is_some()).collect();
    assert_eq!(revoked.len(), 2);
    assert!(revoked.iter().all(|r| r.last_used_at.is_some()));
}

/// 두 요청의 리프레시 토큰 조회가 모두 끝난 뒤에야 어느 쪽이든 진행하도록 막는 저장소.
/// 두 요청 모두 폐기되지 않은 레코드를 본 상태로 트랜잭션에 들어가므로
/// 조건부 폐기만이 중복 사용을 막을 수 있습니다.
struct LockstepStore {
    inner: MemoryCredentialStore,
    lookups: Barrier,
}

#[async_trait]
impl CredentialStore for LockstepStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTransaction>> {
        self.inner.begin().await
    }

    async fn find_identity(
        &self,
        method: IdentityMethod,
        identifier: &str,
    ) -> AppResult<Option<Identity>> {
        self.inner.find_identity(method, identifier).await
    }

    async fn find_identity_by_account(
        &self,
        account_id: i64,
        method: IdentityMethod,
    ) -> AppResult<Option<Identity>> {
        self.inner.find_identity_by_account(account_id, method).await
    }

    async fn find_account(&self, account_id: i64) -> AppResult<Option<Account>> {
        self.inner.find_account(account_id).await
    }

    async fn find_profile(&self, account_id: i64) -> AppResult<Option<Profile>> {
        self.inner.find_profile(account_id).await
    }

    async fn find_ticket(&self, token: &str) -> AppResult<Option<EmailVerificationTicket>> {
        self.inner.find_ticket(token).await
    }

    async fn find_active_refresh_token(
        &self,
        token_hash: &str,
    ) -> AppResult<Option<RefreshTokenRecord>> {
        let found = self.inner.find_active_refresh_token(token_hash).await;
        self.lookups.wait().await;
        found
    }

    async fn activate_account(&self, account_id: i64) -> AppResult<bool> {
        self.inner.activate_account(account_id).await
    }

    async fn delete_ticket(&self, ticket_id: i64) -> AppResult<()> {
        self.inner.delete_ticket(ticket_id).await
    }

    async fn record_login(&self, identity_id: i64, at: DateTime) -> AppResult<()> {
        self.inner.record_login(identity_id, at).await
    }
}

#[actix_web::test]
async fn test_concurrent_refresh_with_same_secret_succeeds_once() {
    let f = fixture();
    let account_id = verified_user(&f, "alice@x.com", "hunter22").await;
    let pair = f.service.login("alice@x.com", "hunter22").await.unwrap();

    let racing = IdentityService::new(
        Arc::new(LockstepStore {
            inner: f.store.clone(),
            lookups: Barrier::new(2),
        }),
        fast_hasher(),
        f.tokens.clone(),
        RefreshTokenManager::new(0),
        f.mail.clone(),
    );

    let (a, b) = futures_util::join!(
        racing.refresh_access_token(&pair.refresh_token),
        racing.refresh_access_token(&pair.refresh_token),
    );

    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1);
    assert!(matches!(
        if a.is_err() { a } else { b },
        Err(AppError::InvalidRefreshToken)
    ));

    let records = f.store.refresh_tokens_for_account(account_id).await;
    assert_eq!(records.len(), 2);
    assert_eq!(records.iter().filter(|r| r.revoked_at.is_some()).count(), 1);
}

#[actix_web::test]
async fn test_expired_refresh_token_is_rejected() {
    let f = fixture();
    let account_id = verified_user(&f, "alice@x.com", "hunter22").await;

    let (secret, token_hash) = RefreshTokenManager::new(0).generate();
    let mut tx = f.store.begin().await.unwrap();
    tx.insert_refresh_token(NewRefreshToken {
        account_id,
        token_hash,
        expires_at: add_duration(DateTime::now(), Duration::hours(-1)),
    })
    .await
    .unwrap();
    tx.commit().await.unwrap();

    let result = f.service.refresh_access_token(&secret).await;
    assert!(matches!(result, Err(AppError::InvalidRefreshToken)));

    let records = f.store.refresh_tokens_for_account(account_id).await;
    assert_eq!(records.len(), 1);
    assert!(records[0].revoked_at.is_none());
}

#[actix_web::test]
async fn test_refresh_rejects_empty_and_unknown_secrets() {
    let f = fixture();

    assert!(matches!(
        f.service.refresh_access_token("").await,
        Err(AppError::InvalidRefreshToken)
    ));
    assert!(matches!(
        f.service.refresh_access_token("never-issued").await,
        Err(AppError::InvalidRefreshToken)
    ));
}

#[actix_web::test]
async fn test_oauth_first_login_provisions_active_account() {
    let f = fixture();

    let token = f
        .service
        .login_or_register_oauth("bob@x.com", "Bob", IdentityMethod::Google, Some("https://img/bob.png"))
        .await
        .unwrap();

    let claims = f.tokens.verify_token(&token).unwrap();
    assert_eq!(claims.identity_type, IdentityMethod::Google);
    assert_eq!(claims.email, "bob@x.com");

    let account_id = claims.account_id().unwrap();
    let account = f.store.find_account(account_id).await.unwrap().unwrap();
    assert_eq!(account.status, AccountStatus::Active);

    let identity = f
        .store
        .find_identity(IdentityMethod::Google, "bob@x.com")
        .await
        .unwrap()
        .unwrap();
    assert!(identity.password_hash().is_none());

    let profile = f.store.find_profile(account_id).await.unwrap().unwrap();
    assert_eq!(profile.nickname, "Bob");
    assert_eq!(profile.avatar_url.as_deref(), Some("https://img/bob.png"));

    assert!(f.store.refresh_tokens_for_account(account_id).await.is_empty());
}

#[actix_web::test]
async fn test_oauth_second_login_reuses_account() {
    let f = fixture();

    let first = f
        .service
        .login_or_register_oauth("bob@x.com", "Bob", IdentityMethod::Google, None)
        .await
        .unwrap();
    let second = f
        .service
        .login_or_register_oauth("BOB@x.com", "Bobby", IdentityMethod::Google, None)
        .await
        .unwrap();

    let first_id = f.tokens.verify_token(&first).unwrap().account_id().unwrap();
    let second_id = f.tokens.verify_token(&second).unwrap().account_id().unwrap();
    assert_eq!(first_id, second_id);
    assert_eq!(f.store.account_count().await, 1);
    assert_eq!(f.store.identity_count().await, 1);
}

async fn google_last_login(store: &MemoryCredentialStore) -> Option<DateTime> {
    store
        .find_identity(IdentityMethod::Google, "bob@x.com")
        .await
        .unwrap()
        .expect("google identity")
        .last_login_at
}

#[actix_web::test]
async fn test_oauth_login_updates_last_login_at() {
    let f = fixture();

    f.service
        .login_or_register_oauth("bob@x.com", "Bob", IdentityMethod::Google, None)
        .await
        .unwrap();
    let after_signup = google_last_login(&f.store).await.expect("set when the account is provisioned");

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    f.service
        .login_or_register_oauth("bob@x.com", "Bob", IdentityMethod::Google, None)
        .await
        .unwrap();
    let after_second = google_last_login(&f.store).await.expect("set by the second login");

    assert!(after_second > after_signup);
}

#[actix_web::test]
async fn test_oauth_with_email_of_password_account_creates_separate_identity() {
    let f = fixture();
    let email_account = verified_user(&f, "carol@x.com", "hunter22").await;

    let token = f
        .service
        .login_or_register_oauth("carol@x.com", "Carol", IdentityMethod::Google, None)
        .await
        .unwrap();

    let oauth_account = f.tokens.verify_token(&token).unwrap().account_id().unwrap();
    assert_ne!(oauth_account, email_account);
    assert_eq!(f.store.identity_count().await, 2);
}

#[actix_web::test]
async fn test_oauth_rejects_email_method() {
    let f = fixture();

    let result = f
        .service
        .login_or_register_oauth("bob@x.com", "Bob", IdentityMethod::Email, None)
        .await;

    assert!(matches!(result, Err(AppError::ValidationError(_))));
    assert_eq!(f.store.account_count().await, 0);
}

#[actix_web::test]
async fn test_oauth_login_of_suspended_account() {
    let f = fixture();
    let token = f
        .service
        .login_or_register_oauth("bob@x.com", "Bob", IdentityMethod::Google, None)
        .await
        .unwrap();
    let account_id = f.tokens.verify_token(&token).unwrap().account_id().unwrap();

    f.store.set_account_status(account_id, AccountStatus::Banned).await;

    let result = f
        .service
        .login_or_register_oauth("bob@x.com", "Bob", IdentityMethod::Google, None)
        .await;
    assert!(matches!(result, Err(AppError::AccountSuspended)));
}
