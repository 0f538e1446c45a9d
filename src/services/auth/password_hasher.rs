//! 비밀번호 해시 서비스
//!
//! Argon2id(PHC 문자열 형식)로 비밀번호를 해시하고 검증합니다.
//! 검증은 하위 primitive의 상수 시간 비교에 위임하며,
//! 손상된 해시 문자열에 대해서도 에러 대신 `false`를 반환합니다.
//!
//! 이전 시스템에서 이관된 bcrypt 해시(`$2a$`, `$2b$`, `$2y$`)는 검증만 지원합니다.
//!
//! 존재하지 않는 계정의 로그인도 같은 비용을 치르도록, 어떤 입력과도 일치하지 않는
//! 더미 해시(`dummy_digest`)를 생성 시점에 만들어 둡니다.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::config::PasswordCost;
use crate::core::{AppResult, ErrorContext};

#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    dummy_digest: Arc<str>,
}

impl PasswordHasher {
    /// 주어진 비용 파라미터로 해셔를 생성합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::InternalError` - Argon2가 허용하지 않는 파라미터
    pub fn new(cost: PasswordCost) -> AppResult<Self> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .context("Argon2 파라미터 구성 실패")?;

        let mut hasher = Self {
            params,
            dummy_digest: Arc::from(""),
        };
        let unguessable = SaltString::generate(&mut OsRng);
        hasher.dummy_digest = Arc::from(hasher.hash(unguessable.as_str())?);

        Ok(hasher)
    }

    /// 현재 비용 파라미터로 만든, 알려진 평문이 없는 해시
    pub fn dummy_digest(&self) -> &str {
        &self.dummy_digest
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// 평문 비밀번호를 무작위 salt와 함께 해시합니다.
    ///
    /// CPU와 메모리를 의도적으로 많이 사용하므로 비동기 컨텍스트에서는
    /// `web::block`으로 감싸 호출합니다.
    pub fn hash(&self, plain: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .context("비밀번호 해시 실패")
    }

    /// 저장된 해시와 평문 비밀번호가 일치하는지 확인합니다.
    ///
    /// 해시의 비용 파라미터는 PHC 문자열에서 읽으므로
    /// 현재 설정과 다른 비용으로 만든 해시도 검증할 수 있습니다.
    pub fn verify(&self, digest: &str, plain: &str) -> bool {
        if digest.starts_with("$argon2") {
            return match PasswordHash::new(digest) {
                Ok(parsed) => Argon2::default()
                    .verify_password(plain.as_bytes(), &parsed)
                    .is_ok(),
                Err(e) => {
                    log::warn!("손상된 Argon2 해시 문자열: {}", e);
                    false
                }
            };
        }

        if digest.starts_with("$2") {
            return bcrypt::verify(plain, digest).unwrap_or(false);
        }

        false
    }
}
