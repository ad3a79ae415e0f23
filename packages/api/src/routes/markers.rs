use axum::{Router, routing::post};

use crate::state::AppState;

pub mod redeem;

pub fn routes() -> Router<AppState> {
    Router::new().route("/redeem", post(redeem::redeem_marker))
}
