//! MongoDB 연결 관리
//!
//! 자격 증명 저장소가 사용하는 MongoDB 클라이언트를 생성합니다.
//! 다중 문서 트랜잭션을 사용하므로 레플리카셋 또는 샤드 클러스터에 연결해야 합니다.

use log::info;
use mongodb::{options::ClientOptions, Client};

use crate::config::DatabaseConfig;

#[derive(Clone)]
pub struct Database {
    client: Client,
    database_name: String,
}

impl Database {
    /// 환경 변수 설정으로 연결합니다.
    pub async fn new() -> Result<Self, mongodb::error::Error> {
        Self::connect(&DatabaseConfig::uri(), &DatabaseConfig::database_name()).await
    }

    /// 주어진 URI와 데이터베이스 이름으로 연결하고 `ping`으로 연결을 확인합니다.
    pub async fn connect(uri: &str, database_name: &str) -> Result<Self, mongodb::error::Error> {
        let mut client_options = ClientOptions::parse(uri).await?;
        client_options.app_name = Some("account_auth".to_string());

        let client = Client::with_options(client_options)?;

        client
            .database(database_name)
            .run_command(mongodb::bson::doc! { "ping": 1 })
            .await?;

        info!("✅ MongoDB 연결 성공: {}", database_name);

        Ok(Self {
            client,
            database_name: database_name.to_string(),
        })
    }

    pub fn get_database(&self) -> mongodb::Database {
        self.client.database(&self.database_name)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}
