//! 인증 API 응답 DTO
use serde::{Deserialize, Serialize};

use crate::domain::entities::{IdentityMethod, Role};
use crate::domain::models::{AuthenticatedUser, TokenPair};

/// `POST /auth/register` 201 응답
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: i64,
}

/// 로그인 / 토큰 갱신 응답
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(rename = "type")]
    pub token_type: String,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
        }
    }
}

/// `GET /auth/me` 응답
#[derive(Debug, Serialize, Deserialize)]
pub struct UserInfoResponse {
    pub user_id: i64,
    pub email: String,
    pub identity_type: IdentityMethod,
    pub role: Role,
    pub message: String,
}

impl From<AuthenticatedUser> for UserInfoResponse {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            user_id: user.account_id,
            email: user.email,
            identity_type: user.identity_type,
            role: user.role,
            message: "Token is valid!".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_uses_type_field() {
        let response = TokenResponse::from(TokenPair {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
        });

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["type"], "Bearer");
        assert!(json.get("token_type").is_none());
    }
}
