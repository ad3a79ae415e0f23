use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum::http::header::AUTHORIZATION;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Clone)]
pub struct SessionUser {
    pub sub: String,
}

#[derive(Debug, Clone)]
pub enum AppUser {
    Session(SessionUser),
    Unauthorized,
}

impl AppUser {
    pub fn sub(&self) -> Result<String, ApiError> {
        match self {
            AppUser::Session(user) => Ok(user.sub.clone()),
            AppUser::Unauthorized => Err(ApiError::unauthorized("Sign in to redeem markers")),
        }
    }
}

fn bearer_token(request: &Request) -> Option<&str> {
    let header = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
    (!token.is_empty()).then_some(token)
}

/// Resolves the caller from the bearer token. Never rejects by itself:
/// handlers decide whether an unauthenticated caller is acceptable.
pub async fn jwt_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response<Body> {
    let user = match bearer_token(&request).map(|token| state.validate_token(token)) {
        Some(Ok(claims)) => AppUser::Session(SessionUser { sub: claims.sub }),
        Some(Err(e)) => {
            tracing::info!("Rejected session token: {}", e);
            AppUser::Unauthorized
        }
        None => AppUser::Unauthorized,
    };

    request.extensions_mut().insert::<AppUser>(user);
    next.run(request).await
}
