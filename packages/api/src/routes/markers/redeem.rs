use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
};
use m1ssion_types::wire::{RedeemRequest, RedeemSuccess};

use crate::{
    dispatch::ClaimNotification,
    error::ApiError,
    middleware::jwt::AppUser,
    redemption::{RedemptionError, RedemptionRequest},
    state::AppState,
};

fn record_outcome(outcome: &'static str) {
    metrics::counter!("redemptions_total", "outcome" => outcome).increment(1);
}

#[tracing::instrument(name = "POST /markers/redeem", skip(state, user, body))]
pub async fn redeem_marker(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    body: Result<Json<RedeemRequest>, JsonRejection>,
) -> Result<Json<RedeemSuccess>, ApiError> {
    let user_id = user.sub().inspect_err(|_| record_outcome("unauthorized"))?;

    let Json(body) = body.map_err(|e| {
        record_outcome("bad_request");
        ApiError::bad_request(e.body_text())
    })?;
    if body.marker_id.trim().is_empty() {
        record_outcome("bad_request");
        return Err(ApiError::bad_request("markerId is required"));
    }

    let request = RedemptionRequest {
        marker_id: body.marker_id.clone(),
        user_id,
        position: body.position(),
    };

    let receipt = match state.guard.redeem(request, chrono::Utc::now()).await {
        Ok(receipt) => receipt,
        Err(err) => {
            record_outcome(match &err {
                RedemptionError::Rejected { reason, .. } => reason.code(),
                RedemptionError::Store(_) => "unknown_error",
            });
            return Err(err.into());
        }
    };
    record_outcome("success");

    tracing::info!(
        marker_id = %receipt.claim.marker_id,
        user_id = %receipt.claim.user_id,
        receipt_id = %receipt.claim.receipt_id,
        accuracy = body.accuracy,
        "Marker claimed"
    );

    state.dispatcher.dispatch(ClaimNotification {
        user_id: receipt.claim.user_id.clone(),
        marker_id: receipt.claim.marker_id.clone(),
        marker_title: receipt.marker_title.clone(),
        receipt_id: receipt.claim.receipt_id.clone(),
        reward_type: receipt.claim.reward_type.clone(),
        rewards: receipt.rewards,
    });

    Ok(Json(RedeemSuccess {
        ok: true,
        receipt_id: receipt.claim.receipt_id,
        rewards: receipt.rewards,
        next_route: receipt.next_route,
    }))
}
