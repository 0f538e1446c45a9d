//! OAuth 2.0 프로바이더 추상화
//!
//! 핸들러는 이 trait만 알고 있으며, 실제 프로바이더(Google 등)의
//! 토큰 교환 / userinfo 엔드포인트 호출은 구현체가 담당합니다.
//! 테스트에서는 네트워크 없이 고정된 `ProviderUser`를 돌려주는 가짜 구현을 주입합니다.

use async_trait::async_trait;

use crate::core::AppResult;
use crate::domain::entities::IdentityMethod;
use crate::domain::models::ProviderUser;

#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// 이 프로바이더로 생성되는 Identity의 인증 수단
    fn method(&self) -> IdentityMethod;

    /// 사용자를 보낼 프로바이더 인증 페이지 URL
    ///
    /// # Arguments
    ///
    /// * `redirect_uri` - 인증 후 프로바이더가 돌아올 콜백 URL
    /// * `state` - 콜백에서 그대로 돌려받을 불투명 값
    fn authorization_url(&self, redirect_uri: &str, state: &str) -> AppResult<String>;

    /// Authorization Code를 프로바이더가 보증한 사용자 속성으로 교환합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::ExternalServiceError` - 프로바이더 호출 실패 또는 응답 파싱 실패
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> AppResult<ProviderUser>;
}
