use std::{sync::Arc, time::Duration};

use jsonwebtoken::{DecodingKey, Validation, decode};
use sea_orm::{ConnectOptions, Database};
use serde::Deserialize;

use crate::config::Config;
use crate::dispatch::{Dispatcher, DynNotifier, LogNotifier, WebhookNotifier};
use crate::redemption::{
    ClaimStore, DatabaseClaimStore, MemoryClaimStore, RateLimiter, RedemptionGuard,
};

pub type AppState = Arc<State>;

/// Session claims issued by the auth provider
#[derive(Debug, Clone, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub exp: usize,
}

pub struct State {
    pub store: Arc<dyn ClaimStore>,
    pub guard: RedemptionGuard,
    pub dispatcher: Dispatcher,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl State {
    pub async fn new(config: &Config) -> Result<Self, sea_orm::DbErr> {
        let store: Arc<dyn ClaimStore> = match &config.database_url {
            Some(db_url) => {
                let mut opt = ConnectOptions::new(db_url.to_owned());
                opt.max_connections(10)
                    .min_connections(1)
                    .connect_timeout(Duration::from_secs(8))
                    .sqlx_logging(false);
                let store = DatabaseClaimStore::new(Database::connect(opt).await?);
                store.ensure_schema().await?;
                Arc::new(store)
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory claim store");
                Arc::new(MemoryClaimStore::new())
            }
        };

        let dispatch = &config.dispatch;
        let notifier: DynNotifier = if dispatch.push_url.is_some() || dispatch.email_url.is_some() {
            Arc::new(WebhookNotifier::new(
                dispatch.push_url.clone(),
                dispatch.email_url.clone(),
                dispatch.token.clone(),
            ))
        } else {
            Arc::new(LogNotifier)
        };

        Ok(Self::with_parts(config, store, notifier))
    }

    pub fn with_parts(config: &Config, store: Arc<dyn ClaimStore>, notifier: DynNotifier) -> Self {
        let limiter = RateLimiter::new(
            config.redemption.rate_limit_max,
            config.redemption.rate_limit_window,
        );
        let guard = RedemptionGuard::new(store.clone(), limiter, config.redemption.radius_m);

        let mut validation = Validation::default();
        validation.validate_aud = false;

        Self {
            store,
            guard,
            dispatcher: Dispatcher::new(notifier, config.dispatch.email_delay),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        let decoded = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(decoded.claims)
    }
}
