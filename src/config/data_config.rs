//! # Runtime / Data Configuration Module
//!
//! 실행 환경, 비밀번호 해시 비용, HTTP 서버, 자격 증명 저장소 설정을 관리합니다.
//!
//! ```bash
//! export ENVIRONMENT="production"
//! export HOST="0.0.0.0"
//! export PORT="8080"
//! export API_BASE_PATH="/api/v1"
//! export REQUEST_TIMEOUT_SECS="10"
//! export CREDENTIAL_STORE="mongodb"   # mongodb | memory
//! export MONGODB_URI="mongodb://localhost:27017/?replicaSet=rs0"
//! export DATABASE_NAME="account_auth"
//! ```

use std::env;
use std::time::Duration;

use crate::config::FrontendConfig;

const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Test,
    Staging,
    Production,
}

impl Environment {
    pub fn current() -> Self {
        Self::from_str(
            &env::var("ENVIRONMENT").unwrap_or_else(|_| "production".to_string()),
        )
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "test" | "testing" => Environment::Test,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Production,
        }
    }
}

/// Argon2id 비용 파라미터
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordCost {
    /// 메모리 사용량 (KiB)
    pub memory_kib: u32,
    /// 반복 횟수
    pub iterations: u32,
    /// 병렬도
    pub parallelism: u32,
}

pub struct PasswordConfig;

impl PasswordConfig {
    /// 현재 환경의 Argon2 비용
    ///
    /// `ARGON2_MEMORY_KIB`, `ARGON2_ITERATIONS`가 설정되어 있으면 우선 적용됩니다.
    pub fn cost() -> PasswordCost {
        let base = Self::cost_for_env(&Environment::current());

        PasswordCost {
            memory_kib: env::var("ARGON2_MEMORY_KIB")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|m| *m >= 8)
                .unwrap_or(base.memory_kib),
            iterations: env::var("ARGON2_ITERATIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|t| *t >= 1)
                .unwrap_or(base.iterations),
            parallelism: base.parallelism,
        }
    }

    pub fn cost_for_env(env: &Environment) -> PasswordCost {
        match env {
            Environment::Development | Environment::Test => PasswordCost {
                memory_kib: 8,
                iterations: 1,
                parallelism: 1,
            },
            Environment::Staging | Environment::Production => PasswordCost {
                memory_kib: 19 * 1024,
                iterations: 2,
                parallelism: 1,
            },
        }
    }
}

/// 자격 증명 저장소 백엔드 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    MongoDb,
    Memory,
}

pub struct DatabaseConfig;

impl DatabaseConfig {
    pub fn uri() -> String {
        env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string())
    }

    pub fn database_name() -> String {
        env::var("DATABASE_NAME").unwrap_or_else(|_| "account_auth_dev".to_string())
    }

    pub fn backend() -> StoreBackend {
        match env::var("CREDENTIAL_STORE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "memory" | "in-memory" => StoreBackend::Memory,
            _ => StoreBackend::MongoDb,
        }
    }
}

pub struct ServerConfig;

impl ServerConfig {
    pub fn port() -> u16 {
        env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080)
    }

    pub fn host() -> String {
        env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string())
    }

    pub fn api_base_path() -> String {
        normalize_base_path(&env::var("API_BASE_PATH").unwrap_or_else(|_| "/api/v1".to_string()))
    }

    pub fn request_timeout() -> Duration {
        let secs = env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|s| *s > 0)
            .unwrap_or(10);
        Duration::from_secs(secs)
    }
}

/// 핸들러 계층이 공유하는 HTTP 설정
///
/// `web::Data<ServerSettings>`로 주입됩니다.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub api_base_path: String,
    pub request_timeout: Duration,
    /// 설정된 프론트엔드 URL (끝의 `/` 제거)
    pub frontend_url: Option<String>,
    /// OAuth 리턴 URL로 허용되는 추가 origin
    pub allowed_redirect_origins: Vec<String>,
}

impl ServerSettings {
    pub fn from_env() -> Self {
        Self {
            api_base_path: ServerConfig::api_base_path(),
            request_timeout: ServerConfig::request_timeout(),
            frontend_url: FrontendConfig::url(),
            allowed_redirect_origins: FrontendConfig::allowed_redirect_origins(),
        }
    }

    /// 리다이렉트 대상 프론트엔드 URL (미설정 시 `http://localhost:3000`)
    pub fn frontend_url(&self) -> &str {
        self.frontend_url.as_deref().unwrap_or(DEFAULT_FRONTEND_URL)
    }

    /// 주어진 URL이 리다이렉트 허용 origin 중 하나로 시작하는지 확인합니다.
    pub fn is_allowed_return_url(&self, candidate: &str) -> bool {
        if !(candidate.starts_with("http://") || candidate.starts_with("https://")) {
            return false;
        }

        std::iter::once(self.frontend_url())
            .chain(self.allowed_redirect_origins.iter().map(String::as_str))
            .any(|origin| {
                candidate == origin
                    || candidate
                        .strip_prefix(origin)
                        .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('?'))
            })
    }

    /// 허용되지 않은 리턴 URL은 프론트엔드 URL로 대체합니다.
    pub fn resolve_return_url(&self, candidate: Option<&str>) -> String {
        match candidate.map(|c| c.trim().trim_end_matches('/')) {
            Some(url) if self.is_allowed_return_url(url) => url.to_string(),
            _ => self.frontend_url().to_string(),
        }
    }
}

fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
