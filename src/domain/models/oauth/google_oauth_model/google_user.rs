//! Google OAuth 2.0 응답 모델
use serde::Deserialize;

use crate::core::AppError;
use crate::domain::models::oauth::ProviderUser;

/// `https://oauth2.googleapis.com/token` 응답
#[derive(Debug, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
}

/// `https://www.googleapis.com/oauth2/v2/userinfo` 응답
#[derive(Debug, Deserialize)]
pub struct GoogleUserInfo {
    pub id: String,

    pub email: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub picture: Option<String>,

    #[serde(default)]
    pub verified_email: Option<bool>,
}

/// 이메일이 없거나 Google이 검증하지 않은 이메일이면 변환하지 않습니다.
/// 연합 계정은 활성 상태로 생성되므로 미검증 이메일을 받아들이지 않습니다.
impl TryFrom<GoogleUserInfo> for ProviderUser {
    type Error = AppError;

    fn try_from(info: GoogleUserInfo) -> Result<Self, Self::Error> {
        if info.email.trim().is_empty() {
            return Err(AppError::ExternalServiceError(
                "Google 사용자 정보에 이메일이 없습니다".to_string(),
            ));
        }

        if info.verified_email == Some(false) {
            return Err(AppError::AuthenticationError(
                "provider email is not verified".to_string(),
            ));
        }

        let name = info
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| info.email.split('@').next().unwrap_or_default().to_string());

        Ok(ProviderUser {
            subject: info.id,
            email: info.email,
            name,
            picture: info.picture.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_userinfo_into_provider_user() {
        let info: GoogleUserInfo = serde_json::from_str(
            r#"{"id":"1098","email":"bob@x.com","name":"Bob","picture":"https://img/bob.png","verified_email":true}"#,
        )
        .unwrap();

        let user = ProviderUser::try_from(info).unwrap();
        assert_eq!(user.subject, "1098");
        assert_eq!(user.name, "Bob");
        assert_eq!(user.picture, "https://img/bob.png");
    }

    #[test]
    fn test_missing_name_falls_back_to_email_local_part() {
        let info: GoogleUserInfo =
            serde_json::from_str(r#"{"id":"1","email":"carol@x.com"}"#).unwrap();

        let user = ProviderUser::try_from(info).unwrap();
        assert_eq!(user.name, "carol");
        assert_eq!(user.picture, "");
    }

    #[test]
    fn test_unverified_email_is_rejected() {
        let info: GoogleUserInfo = serde_json::from_str(
            r#"{"id":"7","email":"mallory@x.com","verified_email":false}"#,
        )
        .unwrap();

        assert!(matches!(
            ProviderUser::try_from(info),
            Err(AppError::AuthenticationError(_))
        ));
    }

    #[test]
    fn test_blank_email_is_rejected() {
        let info: GoogleUserInfo = serde_json::from_str(r#"{"id":"8","email":" "}"#).unwrap();

        assert!(matches!(
            ProviderUser::try_from(info),
            Err(AppError::ExternalServiceError(_))
        ));
    }
}
