//! 계정 인증 서비스 메인 애플리케이션
//!
//! 환경 설정을 읽어 자격 증명 저장소와 서비스를 초기화하고
//! Actix-web HTTP 서버를 구동합니다.

use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{middleware, web, App, HttpServer};
use dotenv::dotenv;
use env_logger::Env;
use log::{error, info, warn};

use account_auth_service::config::{
    DatabaseConfig, JwtConfig, PasswordConfig, ServerConfig, ServerSettings, SmtpConfig,
    StoreBackend,
};
use account_auth_service::db::Database;
use account_auth_service::repositories::credentials::{
    CredentialStore, MemoryCredentialStore, MongoCredentialStore,
};
use account_auth_service::routes::configure_all_routes;
use account_auth_service::services::auth::{
    GoogleAuthService, OAuthProvider, PasswordHasher, RefreshTokenManager, TokenService,
};
use account_auth_service::services::email::build_email_gateway;
use account_auth_service::services::identity::IdentityService;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 환경 설정 및 로깅 초기화
    load_env_file();
    init_logging();

    info!("🚀 계정 인증 서비스 시작중...");

    let store = initialize_store().await?;

    let token_service = TokenService::new(&JwtConfig::secret(), JwtConfig::expiration_hours());
    let hasher = PasswordHasher::new(PasswordConfig::cost()).map_err(io::Error::other)?;
    let email_gateway = build_email_gateway(&SmtpConfig::from_env()).map_err(io::Error::other)?;

    let identity_service = IdentityService::new(
        store,
        hasher,
        token_service.clone(),
        RefreshTokenManager::new(JwtConfig::refresh_expiration_hours()),
        email_gateway,
    );

    let google: Option<Arc<dyn OAuthProvider>> = match GoogleAuthService::from_env() {
        Some(service) => Some(Arc::new(service)),
        None => {
            warn!("GOOGLE_CLIENT_ID / GOOGLE_CLIENT_SECRET 미설정: Google 로그인 비활성화");
            None
        }
    };

    info!("✅ 모든 서비스가 성공적으로 초기화되었습니다!");

    start_http_server(
        web::Data::new(identity_service),
        web::Data::new(token_service),
        web::Data::new(ServerSettings::from_env()),
        google.map(web::Data::from),
    )
    .await
}

/// HTTP 서버를 구성하고 실행합니다
///
/// CORS, 로깅, 경로 정규화 미들웨어를 포함합니다.
///
/// # Errors
///
/// * `std::io::Error` - 포트 바인딩 실패 또는 서버 실행 오류
async fn start_http_server(
    identity_service: web::Data<IdentityService>,
    token_service: web::Data<TokenService>,
    settings: web::Data<ServerSettings>,
    google: Option<web::Data<dyn OAuthProvider>>,
) -> io::Result<()> {
    let bind_address = format!("{}:{}", ServerConfig::host(), ServerConfig::port());

    info!("🌐 서버가 http://{} 에서 실행중입니다", bind_address);
    info!("📍 Health check: http://{}/health", bind_address);
    info!("📍 Auth API: http://{}{}/auth", bind_address, settings.api_base_path);

    HttpServer::new(move || {
        let cors = configure_cors(&settings);
        let api_base_path = settings.api_base_path.clone();

        let mut app = App::new()
            .app_data(identity_service.clone())
            .app_data(token_service.clone())
            .app_data(settings.clone());
        if let Some(google) = &google {
            app = app.app_data(google.clone());
        }

        app.wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(|cfg| configure_all_routes(cfg, &api_base_path))
    })
    .bind(bind_address)?
    .run()
    .await
}

/// 환경별 설정 파일을 로드합니다
///
/// # Environment Variables
///
/// * `PROFILE=dev` - .env.dev 파일 로드 (기본값)
/// * `PROFILE=prod` - .env.prod 파일 로드
/// * 기타 - 기본 .env 파일 로드
fn load_env_file() {
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "dev".to_string());

    match profile.as_str() {
        "prod" => {
            if let Err(e) = dotenv::from_filename(".env.prod") {
                eprintln!(".env.prod 파일 로드 실패: {}", e);
            }
        }
        "dev" => {
            if let Err(e) = dotenv::from_filename(".env.dev") {
                eprintln!(".env.dev 파일 로드 실패: {}", e);
            }
        }
        _ => {
            dotenv().ok();
        }
    }
}

/// 로깅 시스템을 초기화합니다
///
/// ```bash
/// RUST_LOG=debug cargo run
/// RUST_LOG=account_auth_service::services=debug cargo run
/// ```
fn init_logging() {
    env_logger::init_from_env(Env::default().default_filter_or("info,actix_web=debug"));
}

/// `CREDENTIAL_STORE` 설정에 따라 자격 증명 저장소를 생성합니다.
async fn initialize_store() -> io::Result<Arc<dyn CredentialStore>> {
    match DatabaseConfig::backend() {
        StoreBackend::Memory => {
            warn!("⚠️ 인메모리 자격 증명 저장소 사용 (재시작 시 데이터 소실)");
            Ok(Arc::new(MemoryCredentialStore::new()))
        }
        StoreBackend::MongoDb => {
            info!("📡 데이터베이스 연결 중...");

            let database = Database::new().await.map_err(|e| {
                error!("데이터베이스 연결 실패: {}", e);
                io::Error::other(e)
            })?;

            let store = MongoCredentialStore::new(Arc::new(database));
            store.create_indexes().await.map_err(|e| {
                error!("인덱스 생성 실패: {}", e);
                io::Error::other(e.to_string())
            })?;

            Ok(Arc::new(store))
        }
    }
}

/// 프론트엔드 origin에 대한 CORS 설정
fn configure_cors(settings: &ServerSettings) -> Cors {
    let cors = settings
        .allowed_redirect_origins
        .iter()
        .fold(Cors::default().allowed_origin(settings.frontend_url()), |cors, origin| {
            cors.allowed_origin(origin)
        });

    cors.allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
        ])
        .supports_credentials()
        .max_age(3600)
}
