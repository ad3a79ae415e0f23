//! Proximity-gated, one-per-user marker redemption.
//!
//! A redemption moves through `Requested -> Validated -> Claimed` or stops at
//! `Rejected(reason)`. Each state is its own type so a claim can only be made
//! from a validated request.
//!
//! The already-claimed check in [`RedemptionGuard::validate`] is an optimisation.
//! Uniqueness is decided by [`ClaimStore::insert_claim`]; losing that race is
//! reported as `AlreadyClaimed`, never as a storage error.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use m1ssion_geo::{distance, within_radius};
use m1ssion_types::{Claim, Coordinates, Marker, Rejection, Visibility, create_id};

mod database;
mod memory;
mod rate_limit;
mod store;

pub use database::DatabaseClaimStore;
pub use memory::MemoryClaimStore;
pub use rate_limit::RateLimiter;
pub use store::{ClaimInsert, ClaimStore, StoreError, StoreResult};

#[derive(Debug, thiserror::Error)]
pub enum RedemptionError {
    #[error("{reason}")]
    Rejected {
        reason: Rejection,
        detail: Option<String>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RedemptionError {
    fn rejected(reason: Rejection, detail: impl Into<String>) -> Self {
        RedemptionError::Rejected {
            reason,
            detail: Some(detail.into()),
        }
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            RedemptionError::Rejected { reason, .. } => Some(*reason),
            RedemptionError::Store(_) => None,
        }
    }
}

impl From<Rejection> for RedemptionError {
    fn from(reason: Rejection) -> Self {
        RedemptionError::Rejected {
            reason,
            detail: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RedemptionRequest {
    pub marker_id: String,
    pub user_id: String,
    pub position: Option<Coordinates>,
}

/// A request that passed every check. Only the guard can create one.
#[derive(Debug, Clone)]
pub struct ValidatedRedemption {
    marker: Marker,
    user_id: String,
}

#[derive(Debug, Clone)]
pub struct ClaimReceipt {
    pub claim: Claim,
    pub marker_title: String,
    pub rewards: i64,
    pub next_route: Option<String>,
}

pub struct RedemptionGuard {
    store: Arc<dyn ClaimStore>,
    limiter: RateLimiter,
    default_radius_m: f64,
}

impl RedemptionGuard {
    pub fn new(store: Arc<dyn ClaimStore>, limiter: RateLimiter, default_radius_m: f64) -> Self {
        Self {
            store,
            limiter,
            default_radius_m,
        }
    }

    /// Rate limit, validate and claim in one go.
    pub async fn redeem(
        &self,
        request: RedemptionRequest,
        now: DateTime<Utc>,
    ) -> Result<ClaimReceipt, RedemptionError> {
        self.limiter.check(&request.user_id)?;
        let validated = self.validate(request, now).await?;
        self.claim(validated, now).await
    }

    pub async fn validate(
        &self,
        request: RedemptionRequest,
        now: DateTime<Utc>,
    ) -> Result<ValidatedRedemption, RedemptionError> {
        let Some(marker) = self.store.find_marker(&request.marker_id).await? else {
            return Err(RedemptionError::rejected(
                Rejection::Inactive,
                "marker not found",
            ));
        };

        // a lapsed window wins over the active flag
        let visibility = marker.visibility_at(now);
        if visibility == Visibility::Lapsed {
            return Err(RedemptionError::rejected(
                Rejection::Expired,
                "visibility window has ended",
            ));
        }
        if !marker.active {
            return Err(Rejection::Inactive.into());
        }
        if visibility == Visibility::NotYetVisible {
            return Err(RedemptionError::rejected(
                Rejection::Expired,
                "marker is not visible yet",
            ));
        }

        let Some(position) = request.position.filter(Coordinates::is_valid) else {
            return Err(RedemptionError::rejected(
                Rejection::OutOfRange,
                "a valid location is required",
            ));
        };
        let radius_m = marker.radius_or(self.default_radius_m);
        if !within_radius(position, marker.position, radius_m) {
            let distance_m = distance(position, marker.position);
            return Err(RedemptionError::rejected(
                Rejection::OutOfRange,
                format!("{:.0}m away, must be within {:.0}m", distance_m, radius_m),
            ));
        }

        if self
            .store
            .claim_exists(&marker.id, &request.user_id)
            .await?
        {
            return Err(Rejection::AlreadyClaimed.into());
        }

        Ok(ValidatedRedemption {
            marker,
            user_id: request.user_id,
        })
    }

    pub async fn claim(
        &self,
        validated: ValidatedRedemption,
        now: DateTime<Utc>,
    ) -> Result<ClaimReceipt, RedemptionError> {
        let ValidatedRedemption { marker, user_id } = validated;

        let claim = Claim {
            marker_id: marker.id.clone(),
            user_id,
            receipt_id: create_id(),
            reward_type: marker.reward.kind.clone(),
            reward_data: marker.reward.data.clone(),
            created_at: now,
        };

        match self.store.insert_claim(claim).await? {
            ClaimInsert::Inserted(claim) => Ok(ClaimReceipt {
                claim,
                marker_title: marker.title,
                rewards: marker.reward.amount,
                next_route: marker.next_route,
            }),
            ClaimInsert::Duplicate => {
                tracing::info!(marker_id = %marker.id, "Lost claim race, already claimed");
                Err(Rejection::AlreadyClaimed.into())
            }
        }
    }
}
