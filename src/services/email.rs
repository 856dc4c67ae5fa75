use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailTemplate {
    EnquiryNotification,
    EnquiryAcknowledgement,
    NewsletterWelcome,
    ResumeReceived,
    ResumeConfirmation,
}

impl EmailTemplate {
    pub fn subject(&self) -> &'static str {
        match self {
            EmailTemplate::EnquiryNotification => "New Enquiry Received",
            EmailTemplate::EnquiryAcknowledgement => "Enquiry Received - Thank You for Connecting",
            EmailTemplate::NewsletterWelcome => "Welcome to our Newsletter",
            EmailTemplate::ResumeReceived => "New Resume Submission",
            EmailTemplate::ResumeConfirmation => "Resume Submission Confirmation",
        }
    }
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(
        &self,
        template: EmailTemplate,
        recipient: &str,
        fields: serde_json::Value,
    ) -> Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailEnvelope {
    pub from: String,

    pub to: String,

    pub subject: String,

    pub template: EmailTemplate,

    pub fields: serde_json::Value,
}

/// Hands mails to a transactional mail relay over HTTP.
#[derive(Clone)]
pub struct HttpEmailSender {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    from: String,
}

impl HttpEmailSender {
    pub fn new(api_url: String, api_key: Option<String>, from: String) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()?,
            api_url,
            api_key,
            from,
        })
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(
        &self,
        template: EmailTemplate,
        recipient: &str,
        fields: serde_json::Value,
    ) -> Result<()> {
        let envelope = EmailEnvelope {
            from: self.from.clone(),
            to: recipient.to_string(),
            subject: template.subject().to_string(),
            template,
            fields,
        };

        info!("Sending {:?} mail to {}", template, recipient);

        let mut request = self.client.post(&self.api_url).json(&envelope);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        match request.send().await {
            Ok(response) => {
                if response.status().is_success() {
                    info!(
                        "Mail accepted by relay (status: {})",
                        response.status()
                    );
                    Ok(())
                } else {
                    warn!(
                        "Mail relay rejected {:?} mail with status {}",
                        template,
                        response.status()
                    );
                    Err(anyhow::anyhow!(
                        "Mail relay returned status {}",
                        response.status()
                    ))
                }
            }
            Err(err) => {
                error!("Failed to reach mail relay {}: {}", self.api_url, err);
                Err(anyhow::anyhow!("Mail relay request failed: {}", err))
            }
        }
    }
}

/// Used when no relay is configured: the mail is logged and dropped.
#[derive(Debug, Clone, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(
        &self,
        template: EmailTemplate,
        recipient: &str,
        fields: serde_json::Value,
    ) -> Result<()> {
        info!(
            "Mail relay not configured; would send {:?} to {} with {}",
            template, recipient, fields
        );
        Ok(())
    }
}

/// Sends in the background. Failures are logged and never reach the caller.
pub fn dispatch(
    sender: Arc<dyn EmailSender>,
    template: EmailTemplate,
    recipient: String,
    fields: serde_json::Value,
) {
    tokio::spawn(async move {
        if let Err(err) = sender.send(template, &recipient, fields).await {
            error!("Failed to send {:?} mail to {}: {}", template, recipient, err);
        }
    });
}
