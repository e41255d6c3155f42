use std::time::Duration;

use async_trait::async_trait;
use lettre::address::AddressError;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use courier_common::config::{SmtpSettings, SmtpTls};
use courier_common::error::AppError;

use crate::error::TransportError;
use crate::transport::Transport;

/// Per-connection timeout, so one stuck relay only stalls its own worker.
const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// SMTP delivery over an authenticated relay. Opens one connection per message.
pub struct SmtpTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpTransport {
    pub fn new(settings: &SmtpSettings, from: &str) -> Result<Self, AppError> {
        let from: Mailbox = from
            .parse()
            .map_err(|e: AddressError| AppError::Config(format!("Invalid sender `{from}`: {e}")))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
            .port(settings.port)
            .tls(tls_for(settings)?)
            .timeout(Some(SMTP_TIMEOUT));

        if !settings.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ));
        }

        tracing::info!(
            host = %settings.host,
            port = settings.port,
            tls = ?settings.tls,
            "SMTP transport configured"
        );

        Ok(Self {
            mailer: builder.build(),
            from,
        })
    }

    fn build_message(&self, address: &str, subject: &str, body: &str) -> Result<Message, TransportError> {
        let to: Mailbox = address
            .parse()
            .map_err(|e: AddressError| TransportError::InvalidAddress {
                address: address.to_string(),
                reason: e.to_string(),
            })?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body.to_string())
            .map_err(|e| TransportError::Build(e.to_string()))
    }
}

fn tls_for(settings: &SmtpSettings) -> Result<Tls, AppError> {
    let parameters = || {
        TlsParameters::new(settings.host.clone()).map_err(|e| {
            AppError::Config(format!("Invalid SMTP relay `{}`: {e}", settings.host))
        })
    };

    Ok(match settings.tls {
        SmtpTls::Opportunistic => Tls::Opportunistic(parameters()?),
        SmtpTls::Starttls => Tls::Required(parameters()?),
        SmtpTls::Tls => Tls::Wrapper(parameters()?),
        SmtpTls::None => Tls::None,
    })
}

#[async_trait]
impl Transport for SmtpTransport {
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<(), TransportError> {
        let message = self.build_message(address, subject, body)?;
        self.mailer.send(message).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
