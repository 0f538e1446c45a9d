//! 인증 및 보안 서비스 모듈
//!
//! 비밀번호 해시, JWT 액세스 토큰, 리프레시 토큰, OAuth 프로바이더 호출을 담당합니다.
//! 각 서비스는 상태가 없거나 불변 설정만 가지므로 `Clone`으로 공유됩니다.
//!
//! # Examples
//!
//! ```rust,ignore
//! use crate::services::auth::{PasswordHasher, TokenService, RefreshTokenManager};
//!
//! let hasher = PasswordHasher::new(PasswordConfig::cost())?;
//! let tokens = TokenService::new(&JwtConfig::secret(), JwtConfig::expiration_hours());
//! let refresh = RefreshTokenManager::new(JwtConfig::refresh_expiration_hours());
//! ```

pub mod google_auth_service;
pub mod oauth_provider;
pub mod password_hasher;
pub mod refresh_token_manager;
pub mod token_service;

pub use google_auth_service::*;
pub use oauth_provider::*;
pub use password_hasher::*;
pub use refresh_token_manager::*;
pub use token_service::*;
