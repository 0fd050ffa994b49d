use crate::config::SmtpConfig;
use crate::plugins::traits::{NotifierPlugin, NotificationEvent, NotificationResult};
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use lettre::message::{header, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

const SUBJECT_TITLE_CHARS: usize = 50;

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
    pub to_email: String,
    pub use_tls: bool,
}

impl EmailConfig {
    /// Sender and recipient fall back to the SMTP account address.
    pub fn from_smtp(config: &SmtpConfig) -> Result<Self> {
        let username = config
            .username
            .clone()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AppError::Validation("Missing SMTP username".to_string()))?;
        let password = config
            .password
            .clone()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::Validation("Missing SMTP password".to_string()))?;
        let from_email = config.from_address.clone().unwrap_or_else(|| username.clone());
        let to_email = config.to_address.clone().unwrap_or_else(|| from_email.clone());

        Ok(EmailConfig {
            smtp_server: config.host.clone(),
            smtp_port: config.port,
            username,
            password,
            from_email,
            from_name: config.from_name.clone(),
            to_email,
            use_tls: config.use_tls,
        })
    }
}

pub struct EmailNotifier {
    config: EmailConfig,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Result<Self> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());

        let mailer = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_server)
        }
        .port(config.smtp_port)
        .credentials(credentials)
        .build();

        Ok(EmailNotifier { config, mailer })
    }

    fn format_subject(&self, event: &NotificationEvent) -> String {
        format!("🎉 Price Alert: {}", event.snapshot.short_title(SUBJECT_TITLE_CHARS))
    }

    fn format_html_body(&self, event: &NotificationEvent) -> String {
        let mut html = String::new();
        let difference_color = if event.decision.should_alert { "#2E8B57" } else { "#B12704" };

        html.push_str(&format!(r#"
<html>
<body>
    <h2 style="color: #ff9900;">🎉 Price Drop Alert!</h2>
    <div style="border: 1px solid #ddd; padding: 20px; border-radius: 8px; max-width: 600px;">
        <h3 style="color: #333;">{}</h3>
"#, escape_html(&event.snapshot.title)));

        html.push_str(&format!(r#"
        <div style="margin: 20px 0;">
            <p style="font-size: 24px; color: #B12704; font-weight: bold;">Current Price: {}</p>
            <p style="font-size: 16px; color: #666;">Target Price: {}</p>
            <p style="font-size: 14px; color: {};">Price Difference: {}</p>
        </div>
"#, event.formatted_current(), event.formatted_target(), difference_color, event.formatted_difference()));

        html.push_str(&format!(r#"
        <div style="margin: 20px 0;">
            <a href="{}" style="background-color: #ff9900; color: white; padding: 12px 24px; text-decoration: none; border-radius: 4px; font-weight: bold;">🛒 Buy Now</a>
        </div>
        <div style="margin-top: 20px; padding-top: 20px; border-top: 1px solid #eee;">
            <p style="font-size: 12px; color: #999;">Alert triggered on: {}</p>
        </div>
    </div>
</body>
</html>
"#, escape_html(&event.snapshot.source_url), event.captured_at()));

        html
    }

    fn format_text_body(&self, event: &NotificationEvent) -> String {
        let mut text = String::new();

        text.push_str("🎉 PRICE DROP ALERT\n\n");
        text.push_str(&format!("Product: {}\n", event.snapshot.title));
        text.push_str(&format!("Current Price: {}\n", event.formatted_current()));
        text.push_str(&format!("Target Price: {}\n", event.formatted_target()));
        text.push_str(&format!("Price Difference: {}\n\n", event.formatted_difference()));
        text.push_str(&format!("Buy Now: {}\n\n", event.snapshot.source_url));
        text.push_str(&format!("Alert triggered on: {}\n", event.captured_at()));

        text
    }

    fn build_message(&self, event: &NotificationEvent) -> Result<Message> {
        let from = Mailbox::new(Some(self.config.from_name.clone()), self.config.from_email.parse::<Address>()?);
        let to = Mailbox::new(None, self.config.to_email.parse::<Address>()?);

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(self.format_subject(event))
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(self.format_text_body(event))
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(self.format_html_body(event))
                    )
            )?;

        Ok(message)
    }
}

#[async_trait]
impl NotifierPlugin for EmailNotifier {
    fn name(&self) -> &str {
        "Email Notifier"
    }

    fn plugin_type(&self) -> &str {
        "email"
    }

    fn description(&self) -> &str {
        "Sends price alerts via SMTP email with HTML formatting"
    }

    async fn notify(&self, event: &NotificationEvent) -> Result<NotificationResult> {
        let email = self.build_message(event)?;

        match self.mailer.send(email).await {
            Ok(_response) => {
                tracing::info!("Email alert sent to {}", self.config.to_email);
                Ok(NotificationResult::delivered(format!("email-{}", chrono::Utc::now().timestamp())))
            }
            Err(e) => {
                tracing::warn!(
                    "SMTP delivery via {}:{} failed: {}",
                    self.config.smtp_server,
                    self.config.smtp_port,
                    e
                );
                Ok(NotificationResult::failed(e.to_string()))
            }
        }
    }

    async fn test_connection(&self) -> Result<bool> {
        match self.mailer.test_connection().await {
            Ok(connected) => Ok(connected),
            Err(e) => {
                tracing::warn!("SMTP connection test against {} failed: {}", self.config.smtp_server, e);
                Ok(false)
            }
        }
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
