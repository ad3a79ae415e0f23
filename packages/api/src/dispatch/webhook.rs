use reqwest::Client;

use super::{Channel, ClaimNotification, DispatchError, Notifier};

/// Posts claim notifications to the push and email edge functions
pub struct WebhookNotifier {
    client: Client,
    push_url: Option<String>,
    email_url: Option<String>,
    token: Option<String>,
}

impl WebhookNotifier {
    pub fn new(push_url: Option<String>, email_url: Option<String>, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            push_url,
            email_url,
            token,
        }
    }

    fn url(&self, channel: Channel) -> Option<&str> {
        match channel {
            Channel::Push => self.push_url.as_deref(),
            Channel::Email => self.email_url.as_deref(),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(
        &self,
        channel: Channel,
        notification: &ClaimNotification,
    ) -> Result<(), DispatchError> {
        let Some(url) = self.url(channel) else {
            tracing::debug!(?channel, "No webhook configured, skipping");
            return Ok(());
        };

        let mut request = self.client.post(url).json(notification);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Status(status.as_u16()));
        }

        tracing::debug!(?channel, receipt_id = %notification.receipt_id, "Claim notification sent");
        Ok(())
    }
}
