//! OAuth 프로바이더가 보증한 사용자 속성
//!
//! 프로바이더별 userinfo 응답은 이 구조체로 변환된 뒤 `IdentityService`에 전달됩니다.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUser {
    /// 프로바이더 측 사용자 식별자 (`sub` / `id`)
    pub subject: String,
    pub email: String,
    pub name: String,
    /// 프로필 이미지 URL (없으면 빈 문자열)
    pub picture: String,
}
