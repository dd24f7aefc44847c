//! Transactional email through the AWS SES SMTP interface.
//!
//! Uses lettre for delivery with Askama text and HTML templates. When SES is
//! not configured, messages are logged and dropped.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::SesConfig;

/// SES SMTP submission port (STARTTLS).
const SES_SMTP_PORT: u16 = 587;

#[derive(Template)]
#[template(path = "email/newsletter_welcome.html")]
struct NewsletterWelcomeHtml<'a> {
    band_name: &'a str,
    name: Option<&'a str>,
    site_url: &'a str,
    unsubscribe_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/newsletter_welcome.txt")]
struct NewsletterWelcomeText<'a> {
    band_name: &'a str,
    name: Option<&'a str>,
    site_url: &'a str,
    unsubscribe_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/two_factor_enabled.html")]
struct TwoFactorEnabledHtml<'a> {
    name: &'a str,
    band_name: &'a str,
}

#[derive(Template)]
#[template(path = "email/two_factor_enabled.txt")]
struct TwoFactorEnabledText<'a> {
    name: &'a str,
    band_name: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Contents of a newsletter welcome email.
#[derive(Debug, Clone, Copy)]
pub struct NewsletterWelcome<'a> {
    pub band_name: &'a str,
    pub name: Option<&'a str>,
    pub site_url: &'a str,
    pub unsubscribe_url: &'a str,
}

/// Email service for transactional mail.
#[derive(Clone)]
pub struct EmailService {
    transport: Option<SesTransport>,
}

#[derive(Clone)]
struct SesTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create the service. `None` disables delivery.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: Option<&SesConfig>) -> Result<Self, SmtpError> {
        let Some(config) = config else {
            tracing::warn!("SES is not configured; outgoing email will be logged and dropped");
            return Ok(Self::disabled());
        };

        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host())?
            .port(SES_SMTP_PORT)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport: Some(SesTransport {
                mailer,
                from_address: config.from_address.clone(),
            }),
        })
    }

    /// A service that never sends.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { transport: None }
    }

    /// Whether messages are actually delivered.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Send the welcome email for a new newsletter subscriber.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_newsletter_welcome(
        &self,
        to: &str,
        welcome: NewsletterWelcome<'_>,
    ) -> Result<(), EmailError> {
        let html = NewsletterWelcomeHtml {
            band_name: welcome.band_name,
            name: welcome.name,
            site_url: welcome.site_url,
            unsubscribe_url: welcome.unsubscribe_url,
        }
        .render()?;
        let text = NewsletterWelcomeText {
            band_name: welcome.band_name,
            name: welcome.name,
            site_url: welcome.site_url,
            unsubscribe_url: welcome.unsubscribe_url,
        }
        .render()?;

        let subject = format!("You're on the {} mailing list", welcome.band_name);
        self.send_multipart_email(to, &subject, &text, &html).await
    }

    /// Notify an admin that two-factor authentication was turned on.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_two_factor_enabled(
        &self,
        to: &str,
        name: &str,
        band_name: &str,
    ) -> Result<(), EmailError> {
        let html = TwoFactorEnabledHtml { name, band_name }.render()?;
        let text = TwoFactorEnabledText { name, band_name }.render()?;

        self.send_multipart_email(
            to,
            "Two-factor authentication enabled",
            &text,
            &html,
        )
        .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let Some(transport) = &self.transport else {
            tracing::info!(to = %to, subject = %subject, "Email disabled, dropping message");
            return Ok(());
        };

        let email = Message::builder()
            .from(
                transport
                    .from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(transport.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        transport.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}
