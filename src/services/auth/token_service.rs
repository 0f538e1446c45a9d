//! JWT 액세스 토큰 서비스
//!
//! HS256 대칭키 서명으로 액세스 토큰을 발급하고 검증합니다.
//! 액세스 토큰은 자기 완결적이므로 검증 시 저장소를 조회하지 않으며,
//! 만료 전에는 폐기할 수 없습니다.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::core::{AppError, AppResult};
use crate::domain::entities::{Account, Identity};
use crate::domain::models::AccessClaims;

const DEFAULT_EXPIRATION_HOURS: i64 = 24;
const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration: Duration,
}

impl TokenService {
    /// # Arguments
    ///
    /// * `secret` - HMAC 서명 키
    /// * `expiration_hours` - 액세스 토큰 유효 시간. 0 이하이면 24시간
    pub fn new(secret: &str, expiration_hours: i64) -> Self {
        let hours = if expiration_hours > 0 {
            expiration_hours
        } else {
            DEFAULT_EXPIRATION_HOURS
        };

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration: Duration::hours(hours),
        }
    }

    /// 계정과 로그인에 사용된 인증 수단으로 액세스 토큰을 발급합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::InternalError` - 서명 실패
    pub fn issue_access_token(&self, account: &Account, identity: &Identity) -> AppResult<String> {
        let now = Utc::now();

        let claims = AccessClaims {
            sub: account.id.to_string(),
            email: identity.identifier.clone(),
            identity_type: identity.method,
            role: account.role,
            iat: now.timestamp(),
            exp: (now + self.expiration).timestamp(),
        };

        self.sign(&claims)
    }

    fn sign(&self, claims: &AccessClaims) -> AppResult<String> {
        encode(&Header::new(SIGNING_ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(format!("JWT 토큰 생성 실패: {}", e)))
    }

    /// 액세스 토큰 검증 및 클레임 추출
    ///
    /// 서명 불일치, HS256 이외의 알고리즘, 만료된 토큰은 모두 `InvalidToken`입니다.
    /// 만료 검증에 유예 시간(leeway)을 두지 않습니다.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let claims = token_service.verify_token(token)?;
    /// println!("Account ID: {}", claims.sub);
    /// ```
    pub fn verify_token(&self, token: &str) -> AppResult<AccessClaims> {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = 0;

        decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| {
                log::debug!("액세스 토큰 검증 실패: {:?}", e.kind());
                AppError::InvalidToken
            })
    }

    /// `Authorization: Bearer {token}` 헤더에서 토큰 부분을 추출합니다.
    ///
    /// 스킴 비교는 대소문자를 구분하지 않습니다.
    ///
    /// # Errors
    ///
    /// * `AppError::AuthenticationError` - 잘못된 헤더 형식 또는 빈 토큰
    pub fn extract_bearer_token<'a>(&self, auth_header: &'a str) -> AppResult<&'a str> {
        let invalid_format =
            || AppError::AuthenticationError("invalid authorization header format".to_string());

        let (scheme, token) = auth_header.trim().split_once(' ').ok_or_else(invalid_format)?;
        let token = token.trim();

        if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
            return Err(invalid_format());
        }
        Ok(token)
    }
}
