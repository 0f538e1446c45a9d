//! 인증된 사용자 정보
//!
//! `AuthMiddleware`가 액세스 토큰을 검증한 뒤 Request Extensions에 저장하며,
//! 핸들러는 추출자(`FromRequest`)로 꺼내 씁니다.
use std::future::{ready, Ready};

use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use serde::{Deserialize, Serialize};

use crate::core::{AppError, AppResult};
use crate::domain::entities::{IdentityMethod, Role};
use crate::domain::models::token::AccessClaims;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub account_id: i64,
    pub email: String,
    pub identity_type: IdentityMethod,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: AccessClaims) -> AppResult<Self> {
        Ok(Self {
            account_id: claims.account_id()?,
            email: claims.email,
            identity_type: claims.identity_type,
            role: claims.role,
        })
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<actix_web::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(AppError::AuthenticationError(
                "missing authorization header".to_string(),
            )
            .into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str) -> AccessClaims {
        AccessClaims {
            sub: sub.to_string(),
            email: "a@x.com".to_string(),
            identity_type: IdentityMethod::Email,
            role: Role::Admin,
            iat: 0,
            exp: 0,
        }
    }

    #[test]
    fn test_from_claims() {
        let user = AuthenticatedUser::from_claims(claims("42")).unwrap();
        assert_eq!(user.account_id, 42);
        assert_eq!(user.role, Role::Admin);
    }

    #[test]
    fn test_from_claims_rejects_non_numeric_subject() {
        assert!(matches!(
            AuthenticatedUser::from_claims(claims("abc")),
            Err(AppError::InvalidToken)
        ));
    }
}
