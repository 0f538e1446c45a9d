//! 이메일 게이트웨이
//!
//! - [`SmtpEmailGateway`]: lettre 비동기 SMTP 전송
//! - [`LogEmailGateway`]: SMTP 미설정 환경에서 인증 링크를 로그로 남김
//!
//! 어떤 구현을 쓸지는 [`build_email_gateway`]가 `SmtpConfig`로 결정합니다.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::core::{AppError, AppResult};

const VERIFICATION_SUBJECT: &str = "Verify your email address";

#[async_trait]
pub trait EmailGateway: Send + Sync {
    /// 인증 링크가 담긴 메일을 보냅니다.
    async fn send_verification_email(&self, to: &str, url: &str) -> AppResult<()>;
}

/// SMTP 릴레이로 메일을 발송합니다.
#[derive(Clone)]
pub struct SmtpEmailGateway {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailGateway {
    /// # Errors
    ///
    /// * `AppError::InternalError` - 발신 주소 형식 오류, SMTP 릴레이 구성 실패
    pub fn new(config: &SmtpConfig) -> AppResult<Self> {
        let from = config
            .from
            .parse::<Mailbox>()
            .map_err(|e| AppError::InternalError(format!("잘못된 SMTP_FROM 주소: {}", e)))?;

        let builder = if !config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        } else if config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| AppError::InternalError(format!("SMTP 전송 구성 실패: {}", e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| AppError::InternalError(format!("SMTP 전송 구성 실패: {}", e)))?
        }
        .port(config.port);

        let builder = match (&config.username, &config.password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl EmailGateway for SmtpEmailGateway {
    async fn send_verification_email(&self, to: &str, url: &str) -> AppResult<()> {
        let recipient = to
            .parse::<Mailbox>()
            .map_err(|e| AppError::ValidationError(format!("잘못된 수신자 주소: {}", e)))?;

        let body = format!(
            "Welcome!\n\nPlease confirm your email address by opening the link below:\n{}\n\nThe link expires in 24 hours. If you did not sign up, you can ignore this email.",
            url
        );

        let email = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(VERIFICATION_SUBJECT)
            .header(header::ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| AppError::InternalError(format!("메일 메시지 생성 실패: {}", e)))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("SMTP 발송 실패: {}", e)))?;

        log::info!("인증 메일 발송 완료: {}", to);
        Ok(())
    }
}

/// 메일 대신 로그에 인증 링크를 출력합니다. (개발 환경용)
#[derive(Debug, Clone, Default)]
pub struct LogEmailGateway;

#[async_trait]
impl EmailGateway for LogEmailGateway {
    async fn send_verification_email(&self, to: &str, url: &str) -> AppResult<()> {
        log::info!("📧 [SMTP 미설정] {} 인증 링크: {}", to, url);
        Ok(())
    }
}

/// 설정에 맞는 이메일 게이트웨이를 생성합니다.
///
/// SMTP 호스트가 비어 있으면 [`LogEmailGateway`]를 사용합니다.
pub fn build_email_gateway(config: &SmtpConfig) -> AppResult<Arc<dyn EmailGateway>> {
    if !config.is_configured() {
        log::warn!("SMTP_HOST가 설정되지 않아 인증 메일을 로그로만 출력합니다");
        return Ok(Arc::new(LogEmailGateway));
    }

    log::info!("SMTP 메일 전송 사용: {}:{}", config.host, config.port);
    Ok(Arc::new(SmtpEmailGateway::new(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn test_log_gateway_always_succeeds() {
        let gateway = LogEmailGateway;
        assert!(gateway
            .send_verification_email("alice@x.com", "http://localhost/auth/verify?token=t")
            .await
            .is_ok());
    }

    #[test]
    fn test_factory_without_host_builds_log_gateway() {
        assert!(build_email_gateway(&SmtpConfig::default()).is_ok());
    }

    #[test]
    fn test_smtp_gateway_rejects_invalid_sender() {
        let config = SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            from: "not an address".to_string(),
            use_tls: true,
            ..SmtpConfig::default()
        };
        assert!(SmtpEmailGateway::new(&config).is_err());
    }

    #[actix_web::test]
    async fn test_smtp_gateway_builds_for_plain_relay() {
        let config = SmtpConfig {
            host: "localhost".to_string(),
            port: 1025,
            from: "no-reply@example.com".to_string(),
            use_tls: false,
            ..SmtpConfig::default()
        };
        assert!(SmtpEmailGateway::new(&config).is_ok());
    }
}
