use std::sync::Arc;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
};
use middleware::{error_reporting::error_reporting_middleware, jwt::jwt_middleware};
use state::State;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, decompression::RequestDecompressionLayer,
    trace::TraceLayer,
};

pub mod config;
pub mod dispatch;
pub mod entity;
pub mod error;
mod middleware;
pub mod redemption;
mod routes;
pub mod state;

pub use axum;
pub mod auth {
    use crate::middleware;
    pub use middleware::jwt::{AppUser, SessionUser};
}

pub use sea_orm;

pub fn construct_router(state: Arc<State>) -> Router {
    let router = Router::new()
        .nest("/health", routes::health::routes())
        .nest("/markers", routes::markers::routes())
        .with_state(state.clone())
        .layer(from_fn(error_reporting_middleware))
        .layer(from_fn_with_state(state, jwt_middleware))
        .layer(CorsLayer::permissive())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestDecompressionLayer::new())
                .layer(CompressionLayer::new()),
        );

    Router::new().nest("/api/v1", router)
}
