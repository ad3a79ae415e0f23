//! Post-claim notifications. Fire-and-forget: nothing here can fail or delay a
//! claim that has already been recorded.

use std::sync::Arc;
use std::time::Duration;

use m1ssion_types::sequence::Sequence;
use serde::Serialize;
use tokio::task::JoinHandle;

mod webhook;

pub use webhook::WebhookNotifier;

#[derive(Debug, Clone, Serialize)]
pub struct ClaimNotification {
    pub user_id: String,
    pub marker_id: String,
    pub marker_title: String,
    pub receipt_id: String,
    pub reward_type: String,
    pub rewards: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Push,
    Email,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider responded with status {0}")]
    Status(u16),
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        channel: Channel,
        notification: &ClaimNotification,
    ) -> Result<(), DispatchError>;
}

pub type DynNotifier = Arc<dyn Notifier>;

/// Used when no providers are configured
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        channel: Channel,
        notification: &ClaimNotification,
    ) -> Result<(), DispatchError> {
        tracing::info!(
            ?channel,
            user_id = %notification.user_id,
            receipt_id = %notification.receipt_id,
            "Claim notification (no provider configured)"
        );
        Ok(())
    }
}

pub struct Dispatcher {
    notifier: DynNotifier,
    email_delay: Duration,
}

impl Dispatcher {
    pub fn new(notifier: DynNotifier, email_delay: Duration) -> Self {
        Self {
            notifier,
            email_delay,
        }
    }

    /// Push right away, email after the configured delay.
    pub fn plan(&self) -> Sequence<Channel> {
        Sequence::new()
            .then(Duration::ZERO, Channel::Push)
            .then(self.email_delay, Channel::Email)
    }

    pub fn dispatch(&self, notification: ClaimNotification) -> JoinHandle<()> {
        let notifier = self.notifier.clone();
        let plan = self.plan();

        tokio::spawn(async move {
            plan.run(|channel| {
                let notifier = notifier.clone();
                let notification = notification.clone();
                async move {
                    if let Err(e) = notifier.notify(channel, &notification).await {
                        tracing::warn!(
                            ?channel,
                            receipt_id = %notification.receipt_id,
                            "Claim notification failed: {}",
                            e
                        );
                    }
                }
            })
            .await;
        })
    }
}
