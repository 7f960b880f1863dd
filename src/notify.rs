//! Outbound notification: the `Notifier` capability plus the welcome email
//! renderer. Delivery is at-least-once; idempotent subscription semantics in
//! the service layer make duplicates harmless.

use async_trait::async_trait;
use chrono::Utc;
use lettre::message::{header, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::SmtpConfig;
use crate::models::ProductRecord;
use crate::utils::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct EmailContent {
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[derive(Debug, Clone)]
pub struct DeliveryInfo {
    pub message_id: String,
    pub recipients: Vec<String>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, content: &EmailContent, recipients: &[String]) -> Result<DeliveryInfo>;
}

/// Subject lines keep the product name readable in narrow clients.
const SUBJECT_TITLE_LIMIT: usize = 50;

fn short_title(title: &str) -> String {
    if title.chars().count() > SUBJECT_TITLE_LIMIT {
        let truncated: String = title.chars().take(SUBJECT_TITLE_LIMIT - 3).collect();
        format!("{truncated}...")
    } else {
        title.to_string()
    }
}

/// Content for the one welcome notification a new subscriber receives.
pub fn render_welcome(record: &ProductRecord) -> EmailContent {
    let title = short_title(&record.title);

    EmailContent {
        subject: format!("Start Tracking {title} with Pricewise"),
        text: format!(
            "You are now tracking {}. We'll notify you of price changes!",
            record.title
        ),
        html: format!(
            r#"<h2>Welcome to Pricewise</h2>
<p>You are now tracking <b>{}</b>.</p>
<p>We'll send you email alerts when the price changes.</p>
<p>Visit <a href="{}" target="_blank">the product page</a> for details.</p>
<p>Thank you for using Pricewise!</p>"#,
            record.title, record.url
        ),
    }
}

pub struct SmtpNotifier {
    config: SmtpConfig,
}

impl SmtpNotifier {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, content: &EmailContent, recipients: &[String]) -> Result<Message> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_address)
            .parse()
            .map_err(|e| AppError::NotificationFailed(format!("bad from address: {e}")))?;

        let mut builder = Message::builder().from(from).subject(content.subject.clone());
        for recipient in recipients {
            let mailbox = recipient
                .parse()
                .map_err(|e| AppError::NotificationFailed(format!("bad recipient {recipient}: {e}")))?;
            builder = builder.to(mailbox);
        }

        builder
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(content.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(content.html.clone()),
                    ),
            )
            .map_err(|e| AppError::NotificationFailed(format!("message build failed: {e}")))
    }

    fn transport(&self) -> Result<SmtpTransport> {
        let mut builder = if self.config.use_tls {
            SmtpTransport::relay(&self.config.host)
                .map_err(|e| AppError::NotificationFailed(format!("smtp relay setup failed: {e}")))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.host)
        };

        builder = builder.port(self.config.port);
        if let (Some(username), Some(password)) = (&self.config.username, &self.config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(builder.build())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, content: &EmailContent, recipients: &[String]) -> Result<DeliveryInfo> {
        if recipients.is_empty() {
            return Err(AppError::NotificationFailed("no recipients".to_string()));
        }

        let message = self.build_message(content, recipients)?;
        let mailer = self.transport()?;

        mailer
            .send(&message)
            .map_err(|e| AppError::NotificationFailed(e.to_string()))?;

        Ok(DeliveryInfo {
            message_id: format!("email-{}", Utc::now().timestamp()),
            recipients: recipients.to_vec(),
        })
    }
}
