//! Device position acquisition with degrading accuracy and a fixed fallback.
//!
//! The watcher asks its [`PositionSource`] for a fix, first with high accuracy
//! and then with progressively looser requirements. Permission denial stops
//! everything for the session. When every attempt fails the fallback location
//! is published so the map always has something to render, and a one-shot
//! warning is queued for the caller.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use m1ssion_types::Coordinates;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

use crate::permission::{PermissionState, PermissionStore};

/// A single position fix. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoReading {
    pub lat: f64,
    pub lng: f64,
    /// Accuracy radius in meters
    pub accuracy: f64,
    pub timestamp: DateTime<Utc>,
}

impl GeoReading {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix the source may return instead of a fresh one
    pub maximum_age: Duration,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PositionError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position request timed out")]
    Timeout,
    #[error("position unavailable: {0}")]
    Unavailable(String),
}

/// Bridge to the platform geolocation API
#[async_trait::async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self, options: &PositionOptions) -> Result<GeoReading, PositionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    PermissionDenied,
    RetriesExhausted,
}

#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// One entry per attempt, tried in order
    pub attempts: Vec<PositionOptions>,
    pub fallback: Coordinates,
    pub fallback_accuracy_m: f64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        let relaxed = PositionOptions {
            high_accuracy: false,
            timeout: Duration::from_secs(15),
            maximum_age: Duration::from_secs(60),
        };
        Self {
            attempts: vec![
                PositionOptions {
                    high_accuracy: true,
                    timeout: Duration::from_secs(30),
                    maximum_age: Duration::ZERO,
                },
                relaxed,
                relaxed,
            ],
            // Rome
            fallback: Coordinates::new(41.9028, 12.4964),
            fallback_accuracy_m: 5_000.0,
        }
    }
}

/// Output of [`GeolocationWatcher::watch`]
pub struct PositionFeed {
    pub readings: watch::Receiver<Option<GeoReading>>,
    /// Carries the fallback warning, at most once per watcher
    pub warnings: mpsc::UnboundedReceiver<FallbackReason>,
}

pub struct GeolocationWatcher {
    source: Arc<dyn PositionSource>,
    store: Arc<dyn PermissionStore>,
    config: WatcherConfig,
    current: Option<GeoReading>,
    permission: PermissionState,
    using_fallback: bool,
    warned: bool,
    pending_warning: Option<FallbackReason>,
}

impl GeolocationWatcher {
    pub fn new(
        source: Arc<dyn PositionSource>,
        store: Arc<dyn PermissionStore>,
        config: WatcherConfig,
    ) -> Self {
        let permission = match store.load() {
            Ok(state) => state.unwrap_or(PermissionState::Prompt),
            Err(e) => {
                tracing::warn!("Failed to load location permission, prompting again: {}", e);
                PermissionState::Prompt
            }
        };

        Self {
            source,
            store,
            config,
            current: None,
            permission,
            using_fallback: false,
            warned: false,
            pending_warning: None,
        }
    }

    pub fn current(&self) -> Option<GeoReading> {
        self.current
    }

    pub fn permission_state(&self) -> PermissionState {
        self.permission
    }

    pub fn is_fallback(&self) -> bool {
        self.using_fallback
    }

    /// Returns the fallback warning once, the first time it is asked for after
    /// the watcher fell back.
    pub fn take_warning(&mut self) -> Option<FallbackReason> {
        self.pending_warning.take()
    }

    /// Acquires a position, always ending with either a real fix or the fallback.
    pub async fn start(&mut self) -> GeoReading {
        if self.permission == PermissionState::Denied {
            tracing::debug!("Location permission previously denied, not prompting");
            return self.fall_back(FallbackReason::PermissionDenied);
        }

        let attempts = self.config.attempts.clone();
        for (attempt, options) in attempts.iter().enumerate() {
            let outcome = tokio::time::timeout(
                options.timeout,
                self.source.current_position(options),
            )
            .await
            .unwrap_or(Err(PositionError::Timeout));

            match outcome {
                Ok(reading) => {
                    self.set_permission(PermissionState::Granted);
                    self.using_fallback = false;
                    self.current = Some(reading);
                    return reading;
                }
                Err(PositionError::PermissionDenied) => {
                    tracing::info!("Location permission denied");
                    self.set_permission(PermissionState::Denied);
                    return self.fall_back(FallbackReason::PermissionDenied);
                }
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        high_accuracy = options.high_accuracy,
                        "Position attempt failed: {}",
                        e
                    );
                }
            }
        }

        self.fall_back(FallbackReason::RetriesExhausted)
    }

    /// Refreshes the position every `interval` and publishes it. The loop ends
    /// when permission is denied or the readings receiver has been dropped.
    pub fn watch(mut self, interval: Duration) -> PositionFeed {
        let (tx, readings) = watch::channel(self.current);
        let (warn_tx, warnings) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            loop {
                let reading = self.start().await;
                if let Some(reason) = self.take_warning() {
                    let _ = warn_tx.send(reason);
                }
                if tx.send(Some(reading)).is_err() {
                    break;
                }
                if self.permission == PermissionState::Denied {
                    break;
                }

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {},
                    _ = tx.closed() => break,
                }
            }
        });

        PositionFeed { readings, warnings }
    }

    fn fall_back(&mut self, reason: FallbackReason) -> GeoReading {
        let reading = GeoReading {
            lat: self.config.fallback.lat,
            lng: self.config.fallback.lng,
            accuracy: self.config.fallback_accuracy_m,
            timestamp: Utc::now(),
        };
        self.current = Some(reading);
        self.using_fallback = true;

        if !self.warned {
            self.warned = true;
            self.pending_warning = Some(reason);
            tracing::warn!(?reason, "Using fallback location");
        }

        reading
    }

    fn set_permission(&mut self, state: PermissionState) {
        if self.permission == state {
            return;
        }
        self.permission = state;
        if let Err(e) = self.store.save(state) {
            tracing::warn!("Failed to persist location permission: {}", e);
        }
    }
}
