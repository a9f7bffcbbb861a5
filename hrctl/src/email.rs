//! Email service for two-factor codes and password reset links.

use lettre::{
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::{path::Path, time::Duration};

use crate::{config::Config, errors::Error};

pub struct EmailService {
    transport: EmailTransport,
    from_email: String,
    from_name: String,
    app_url: String,
}

enum EmailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

impl EmailService {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let email_config = &config.email;

        let transport = match &email_config.smtp {
            Some(smtp) => {
                if !smtp.use_tls {
                    tracing::warn!("SMTP TLS is disabled - this is not recommended for production");
                }

                let mut builder = if smtp.use_tls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
                } else {
                    Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host))
                }
                .map_err(|e| Error::Internal {
                    operation: format!("create SMTP transport: {e}"),
                })?
                .port(smtp.port);

                if !smtp.username.is_empty() {
                    builder = builder.credentials(Credentials::new(smtp.username.clone(), smtp.password.clone()));
                }

                EmailTransport::Smtp(builder.build())
            }
            None => {
                // File transport writes .eml files, for development and tests
                let emails_dir = Path::new(&email_config.file_path);
                if !emails_dir.exists() {
                    std::fs::create_dir_all(emails_dir).map_err(|e| Error::Internal {
                        operation: format!("create emails directory: {e}"),
                    })?;
                }
                EmailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(emails_dir))
            }
        };

        Ok(Self {
            transport,
            from_email: email_config.from_email.clone(),
            from_name: email_config.from_name.clone(),
            app_url: config.app_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn send_two_factor_code(&self, to_email: &str, code: &str, valid_for: Duration) -> Result<(), Error> {
        let body = self.create_two_factor_body(code, valid_for);
        self.send_email(to_email, "Your sign-in verification code", &body).await
    }

    pub async fn send_password_reset_email(
        &self,
        to_email: &str,
        token_id: &uuid::Uuid,
        token: &str,
        valid_for: Duration,
    ) -> Result<(), Error> {
        let reset_link = format!("{}/reset-password?id={}&token={}", self.app_url, token_id, token);
        let body = self.create_password_reset_body(&reset_link, valid_for);
        self.send_email(to_email, "Password Reset Request", &body).await
    }

    async fn send_email(&self, to_email: &str, subject: &str, body: &str) -> Result<(), Error> {
        let from = format!("{} <{}>", self.from_name, self.from_email)
            .parse::<Mailbox>()
            .map_err(|e| Error::Internal {
                operation: format!("parse from email: {e}"),
            })?;

        let to = to_email.parse::<Mailbox>().map_err(|e| Error::Internal {
            operation: format!("parse to email: {e}"),
        })?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body.to_string())
            .map_err(|e| Error::Internal {
                operation: format!("build email message: {e}"),
            })?;

        match &self.transport {
            EmailTransport::Smtp(smtp) => {
                smtp.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send SMTP email: {e}"),
                })?;
            }
            EmailTransport::File(file) => {
                file.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send file email: {e}"),
                })?;
            }
        }

        Ok(())
    }

    fn create_two_factor_body(&self, code: &str, valid_for: Duration) -> String {
        let minutes = valid_for.as_secs().div_ceil(60);
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Verification code</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <h2>Sign-in verification</h2>
    <p>Use the following code to finish signing in to the HR portal:</p>
    <p style="font-size: 28px; letter-spacing: 6px;"><strong>{code}</strong></p>
    <p>The code expires in {minutes} minutes. If you did not try to sign in, change your password.</p>
    <p style="font-size: 12px; color: #666;">This is an automated message, please do not reply to this email.</p>
</body>
</html>"#
        )
    }

    fn create_password_reset_body(&self, reset_link: &str, valid_for: Duration) -> String {
        let minutes = valid_for.as_secs().div_ceil(60);
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Password Reset Request</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <h2>Password Reset Request</h2>
    <p>We received a request to reset your password. If you didn't make this request, you can safely ignore this email.</p>
    <p><a href="{reset_link}">Reset your password</a></p>
    <p>Or copy and paste this link into your browser:</p>
    <p>{reset_link}</p>
    <p>This link will expire in {minutes} minutes.</p>
    <p style="font-size: 12px; color: #666;">This is an automated message, please do not reply to this email.</p>
</body>
</html>"#
        )
    }
}
