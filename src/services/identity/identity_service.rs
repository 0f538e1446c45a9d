//! # Identity Service
//!
//! 회원가입, 이메일 인증, 비밀번호 로그인, OAuth 로그인, 리프레시 토큰 로테이션을
//! 처리하는 인증 흐름의 오케스트레이터입니다. 서비스 자체는 상태를 갖지 않으며,
//! 모든 작업은 자격 증명 저장소에 대한 read-modify-write입니다.
//!
//! ## 구성 요소
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       IdentityService                        │
//! │  register · verify_email · login · login_or_register_oauth   │
//! │  refresh_access_token                                        │
//! └──────────────────────────────────────────────────────────────┘
//!      │             │              │               │          │
//!      ▼             ▼              ▼               ▼          ▼
//! CredentialStore PasswordHasher TokenService RefreshToken  EmailGateway
//!                                             Manager
//! ```
//!
//! ## 트랜잭션 경계
//!
//! | 작업 | 트랜잭션 내부 | 트랜잭션 이후 (best-effort) |
//! |------|---------------|-----------------------------|
//! | 회원가입 | 계정, 이메일 Identity, 프로필, 인증 티켓 | 인증 메일 발송 (백그라운드 태스크) |
//! | 이메일 인증 | (단일 갱신) 계정 활성화 | 티켓 삭제 |
//! | 로그인 | 리프레시 토큰 레코드 생성 | - |
//! | OAuth 가입 | 계정, 연합 Identity, 프로필 | - |
//! | 토큰 갱신 | 기존 레코드 폐기 + 새 레코드 생성 | - |
//!
//! `last_login_at` 갱신은 실패해도 로그인을 막지 않습니다.
//!
//! 트랜잭션을 연 상태에서는 저장소 조회를 호출하지 않습니다.
//! 필요한 조회는 모두 `begin()` 이전에 끝냅니다.

use std::sync::Arc;
use std::time::Instant;

use actix_web::web;
use chrono::Duration;
use mongodb::bson::DateTime;

use crate::core::{AppError, AppResult};
use crate::domain::entities::{
    normalize_email, Account, AccountStatus, Identity, IdentityMethod, NewAccount, NewIdentity,
    NewProfile, NewRefreshToken, NewVerificationTicket,
};
use crate::domain::models::TokenPair;
use crate::repositories::credentials::{CredentialStore, StoreTransaction};
use crate::services::auth::{PasswordHasher, RefreshTokenManager, TokenService};
use crate::services::email::EmailGateway;

const DEFAULT_VERIFICATION_TTL_HOURS: i64 = 24;

#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    tokens: TokenService,
    refresh_tokens: RefreshTokenManager,
    email: Arc<dyn EmailGateway>,
    verification_ttl: Duration,
}

impl IdentityService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        tokens: TokenService,
        refresh_tokens: RefreshTokenManager,
        email: Arc<dyn EmailGateway>,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            refresh_tokens,
            email,
            verification_ttl: Duration::hours(DEFAULT_VERIFICATION_TTL_HOURS),
        }
    }

    /// 이메일 인증 티켓의 유효 기간을 변경합니다. (기본 24시간)
    pub fn with_verification_ttl(mut self, ttl: Duration) -> Self {
        self.verification_ttl = ttl;
        self
    }

    /// 이메일 / 비밀번호 회원가입
    ///
    /// 계정은 `pending_verification` 상태로 생성되며, 인증 링크
    /// `{base_url}/auth/verify?token={token}`이 메일로 발송됩니다.
    ///
    /// # Arguments
    ///
    /// * `username` - 프로필 닉네임
    /// * `email` - 로그인 이메일 (앞뒤 공백 제거, 소문자 정규화)
    /// * `password` - 평문 비밀번호
    /// * `base_url` - 인증 링크의 기준 URL (`http://host/api/v1`)
    ///
    /// # Errors
    ///
    /// * `AppError::AlreadyExists` - 같은 이메일의 이메일 Identity가 이미 존재
    ///
    /// 메일은 커밋 후 백그라운드에서 발송되며, 발송 실패나 지연은 결과에 영향을 주지 않습니다.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        base_url: &str,
    ) -> AppResult<Account> {
        let email = normalize_email(email);

        if self
            .store
            .find_identity(IdentityMethod::Email, &email)
            .await?
            .is_some()
        {
            log::info!("회원가입 거부 (이메일 중복): {}", email);
            return Err(AppError::AlreadyExists);
        }

        let password_hash = self.hash_password(password).await?;

        let mut tx = self.store.begin().await?;
        let account = tx.insert_account(NewAccount::pending_user()).await?;
        tx.insert_identity(NewIdentity::email(account.id, &email, password_hash))
            .await
            .map_err(|e| match e {
                AppError::ConflictError(_) => AppError::AlreadyExists,
                other => other,
            })?;
        tx.insert_profile(NewProfile::new(account.id, username, None))
            .await?;
        let ticket = tx
            .insert_ticket(NewVerificationTicket::issue(
                account.id,
                &email,
                self.verification_ttl,
            ))
            .await?;
        tx.commit().await?;

        log::info!("회원가입 완료: account_id={}, email={}", account.id, email);

        let verify_url = format!(
            "{}/auth/verify?token={}",
            base_url.trim_end_matches('/'),
            ticket.token
        );
        self.send_verification_in_background(account.id, email, verify_url);

        Ok(account)
    }

    /// 인증 메일을 요청 흐름과 분리된 태스크에서 발송합니다.
    ///
    /// 응답은 메일 서버의 지연과 무관하게 커밋 직후 반환되며, 실패는 로그로만 남습니다.
    fn send_verification_in_background(&self, account_id: i64, email: String, verify_url: String) {
        let gateway = Arc::clone(&self.email);

        tokio::spawn(async move {
            if let Err(e) = gateway.send_verification_email(&email, &verify_url).await {
                log::warn!("인증 메일 발송 실패 (account_id={}): {}", account_id, e);
            }
        });
    }

    /// 이메일 인증 토큰을 소비하여 계정을 활성화합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::InvalidVerificationTicket` - 토큰이 없음
    /// * `AppError::ExpiredVerificationTicket` - 만료된 토큰
    pub async fn verify_email(&self, token: &str) -> AppResult<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::InvalidVerificationTicket);
        }

        let ticket = self
            .store
            .find_ticket(token)
            .await?
            .ok_or(AppError::InvalidVerificationTicket)?;

        if ticket.is_expired(DateTime::now()) {
            log::info!("만료된 인증 토큰 사용 시도: account_id={}", ticket.account_id);
            return Err(AppError::ExpiredVerificationTicket);
        }

        if self.store.activate_account(ticket.account_id).await? {
            log::info!("이메일 인증 완료: account_id={}", ticket.account_id);
        } else {
            log::info!(
                "인증 대기 상태가 아닌 계정의 티켓: account_id={}",
                ticket.account_id
            );
        }

        if let Err(e) = self.store.delete_ticket(ticket.id).await {
            log::warn!("인증 티켓 삭제 실패 (ticket_id={}): {}", ticket.id, e);
        }

        Ok(())
    }

    /// 이메일 / 비밀번호 로그인
    ///
    /// 이메일 미존재와 비밀번호 불일치는 같은 `InvalidCredentials`로 응답합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::InvalidCredentials` - 이메일 없음 또는 비밀번호 불일치
    /// * `AppError::EmailNotVerified` - 인증 대기 계정
    /// * `AppError::AccountSuspended` - 정지된 계정
    pub async fn login(&self, email: &str, password: &str) -> AppResult<TokenPair> {
        let email = normalize_email(email);

        let identity = self.store.find_identity(IdentityMethod::Email, &email).await?;
        let Some((identity, digest)) = identity.and_then(|identity| {
            let digest = identity.password_hash()?.to_string();
            Some((identity, digest))
        }) else {
            // 계정 존재 여부가 응답 시간으로 드러나지 않도록 같은 비용의 검증을 수행
            self.verify_password(self.hasher.dummy_digest().to_string(), password)
                .await?;
            return Err(AppError::InvalidCredentials);
        };

        if !self.verify_password(digest, password).await? {
            log::info!("로그인 실패 (비밀번호 불일치): identity_id={}", identity.id);
            return Err(AppError::InvalidCredentials);
        }

        let account = self
            .store
            .find_account(identity.account_id)
            .await?
            .ok_or(AppError::InvalidCredentials)?;
        ensure_active(&account)?;

        self.record_login(&identity).await;

        let mut tx = self.store.begin().await?;
        let pair = self.issue_pair(tx.as_mut(), &account, &identity).await?;
        tx.commit().await?;

        log::info!("로그인 성공: account_id={}", account.id);
        Ok(pair)
    }

    /// OAuth 로그인. 처음 보는 `(provider, email)`이면 계정을 자동 생성합니다.
    ///
    /// 프로바이더가 이메일을 검증했으므로 새 계정은 `active` 상태로 시작합니다.
    /// 이 경로는 액세스 토큰만 발급합니다.
    ///
    /// # Arguments
    ///
    /// * `email` - 프로바이더가 보증한 이메일 (Identity 식별자)
    /// * `name` - 프로필 닉네임
    /// * `provider` - 연합 인증 수단 (`email`은 거부)
    /// * `avatar` - 프로필 이미지 URL
    pub async fn login_or_register_oauth(
        &self,
        email: &str,
        name: &str,
        provider: IdentityMethod,
        avatar: Option<&str>,
    ) -> AppResult<String> {
        if !provider.is_federated() {
            return Err(AppError::ValidationError(format!(
                "{} is not an OAuth provider",
                provider
            )));
        }

        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AppError::ValidationError("provider returned no email".to_string()));
        }

        if let Some(identity) = self.store.find_identity(provider, &email).await? {
            return self.oauth_login_existing(identity).await;
        }

        let now = DateTime::now();
        let mut tx = self.store.begin().await?;
        let account = tx.insert_account(NewAccount::active_user()).await?;

        let new_identity = NewIdentity::federated(account.id, provider, &email, Some(now))?;
        let inserted = tx.insert_identity(new_identity).await;

        let identity = match inserted {
            Ok(identity) => identity,
            Err(AppError::ConflictError(_)) => {
                // 동시 요청이 먼저 가입을 끝냈으므로 그 Identity로 로그인
                drop(tx);
                let existing = self
                    .store
                    .find_identity(provider, &email)
                    .await?
                    .ok_or_else(|| {
                        AppError::InternalError("충돌한 OAuth Identity를 찾을 수 없습니다".into())
                    })?;
                return self.oauth_login_existing(existing).await;
            }
            Err(e) => return Err(e),
        };

        tx.insert_profile(NewProfile::new(account.id, name, avatar))
            .await?;
        tx.commit().await?;

        log::info!(
            "OAuth 가입 완료: account_id={}, provider={}",
            account.id,
            provider
        );
        self.tokens.issue_access_token(&account, &identity)
    }

    async fn oauth_login_existing(&self, identity: Identity) -> AppResult<String> {
        let account = self
            .store
            .find_account(identity.account_id)
            .await?
            .ok_or_else(|| {
                AppError::InternalError(format!(
                    "Identity {}의 계정이 존재하지 않습니다",
                    identity.id
                ))
            })?;
        ensure_active(&account)?;

        self.record_login(&identity).await;

        log::info!(
            "OAuth 로그인 성공: account_id={}, provider={}",
            account.id,
            identity.method
        );
        self.tokens.issue_access_token(&account, &identity)
    }

    /// 리프레시 토큰 로테이션
    ///
    /// 사용된 레코드를 폐기하고 새 토큰 쌍을 같은 트랜잭션에서 발급합니다.
    /// 한 번 사용된 시크릿을 다시 제출하면 항상 `InvalidRefreshToken`입니다.
    ///
    /// # Errors
    ///
    /// * `AppError::InvalidRefreshToken` - 빈 값, 미존재, 만료, 폐기됨, 동시 요청에 선점됨
    /// * `AppError::AccountSuspended` - 정지된 계정
    pub async fn refresh_access_token(&self, refresh_secret: &str) -> AppResult<TokenPair> {
        let refresh_secret = refresh_secret.trim();
        if refresh_secret.is_empty() {
            return Err(AppError::InvalidRefreshToken);
        }

        let hash = self.refresh_tokens.hash(refresh_secret);
        let now = DateTime::now();

        let record = self
            .store
            .find_active_refresh_token(&hash)
            .await?
            .filter(|record| record.is_usable(now))
            .ok_or(AppError::InvalidRefreshToken)?;

        let identity = self
            .store
            .find_identity_by_account(record.account_id, IdentityMethod::Email)
            .await?
            .ok_or(AppError::InvalidRefreshToken)?;
        let account = self
            .store
            .find_account(record.account_id)
            .await?
            .ok_or(AppError::InvalidRefreshToken)?;
        ensure_active(&account)?;

        let mut tx = self.store.begin().await?;
        if !tx.revoke_refresh_token(record.id, now).await? {
            log::warn!(
                "이미 사용된 리프레시 토큰 재사용 시도: record_id={}, account_id={}",
                record.id,
                record.account_id
            );
            return Err(AppError::InvalidRefreshToken);
        }
        let pair = self.issue_pair(tx.as_mut(), &account, &identity).await?;
        tx.commit().await?;

        log::debug!("리프레시 토큰 로테이션: account_id={}", account.id);
        Ok(pair)
    }

    /// 액세스 토큰과 리프레시 토큰을 발급하고 리프레시 레코드를 호출자의 트랜잭션에 기록합니다.
    async fn issue_pair(
        &self,
        tx: &mut dyn StoreTransaction,
        account: &Account,
        identity: &Identity,
    ) -> AppResult<TokenPair> {
        let access_token = self.tokens.issue_access_token(account, identity)?;
        let (refresh_token, token_hash) = self.refresh_tokens.generate();

        tx.insert_refresh_token(NewRefreshToken {
            account_id: account.id,
            token_hash,
            expires_at: self.refresh_tokens.expires_at(DateTime::now()),
        })
        .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    async fn record_login(&self, identity: &Identity) {
        if let Err(e) = self.store.record_login(identity.id, DateTime::now()).await {
            log::warn!("last_login_at 갱신 실패 (identity_id={}): {}", identity.id, e);
        }
    }

    async fn hash_password(&self, password: &str) -> AppResult<String> {
        let hasher = self.hasher.clone();
        let password = password.to_string();

        web::block(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::InternalError(format!("비밀번호 해시 작업 실패: {}", e)))?
    }

    async fn verify_password(&self, digest: String, password: &str) -> AppResult<bool> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        let started = Instant::now();

        let matched = web::block(move || hasher.verify(&digest, &password))
            .await
            .map_err(|e| AppError::InternalError(format!("비밀번호 검증 작업 실패: {}", e)))?;

        log::debug!("Password verification took: {:?}", started.elapsed());
        Ok(matched)
    }
}

fn ensure_active(account: &Account) -> AppResult<()> {
    match account.status {
        AccountStatus::Active => Ok(()),
        AccountStatus::PendingVerification => Err(AppError::EmailNotVerified),
        AccountStatus::Banned => Err(AppError::AccountSuspended),
    }
}
