use axum::{
    Json,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use m1ssion_types::{Rejection, create_id, wire::ErrorEnvelope};

use crate::redemption::{RedemptionError, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportPolicy {
    Ignore,
    Report,
}

/// Attached to responses of reportable failures so the reporting middleware
/// can log them with request context.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub id: String,
    pub status_code: u16,
    pub public_code: String,
    pub summary: String,
    pub details: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    public_code: &'static str,
    public_message: Option<String>,
    report_policy: ReportPolicy,
    report_summary: Option<String>,
    report_details: Option<String>,
}

impl ApiError {
    fn new(
        status: StatusCode,
        public_code: &'static str,
        public_message: Option<String>,
        report_policy: ReportPolicy,
    ) -> Self {
        Self {
            status,
            public_code,
            public_message,
            report_policy,
            report_summary: None,
            report_details: None,
        }
    }

    fn with_report(mut self, summary: impl Into<String>, details: Option<String>) -> Self {
        self.report_summary = Some(summary.into());
        self.report_details = details;
        self
    }

    /// Unexpected infrastructure failure. The cause is reported, never exposed.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "unknown_error",
            None,
            ReportPolicy::Report,
        )
        .with_report(msg, None)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::info!("Bad request: {}", msg);
        Self::new(
            StatusCode::BAD_REQUEST,
            "bad_request",
            Some(msg),
            ReportPolicy::Ignore,
        )
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::rejected(Rejection::Unauthorized, Some(msg.into()))
    }

    /// Policy and state rejections are routine outcomes and are logged at info.
    pub fn rejected(reason: Rejection, detail: Option<String>) -> Self {
        tracing::info!(code = reason.code(), "Redemption rejected: {}", reason);
        let status = StatusCode::from_u16(reason.status_code())
            .unwrap_or(StatusCode::BAD_REQUEST);
        Self::new(status, reason.code(), detail, ReportPolicy::Ignore)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = (self.report_policy == ReportPolicy::Report).then(create_id);

        let mut envelope = ErrorEnvelope::new(self.public_code, self.public_message.clone());
        envelope.id = error_id.clone();

        let mut response = (self.status, Json(envelope)).into_response();

        if let Some(id) = error_id {
            if let Ok(v) = HeaderValue::from_str(&id) {
                response.headers_mut().insert("x-error-id", v);
            }

            let report = ErrorReport {
                id,
                status_code: self.status.as_u16(),
                public_code: self.public_code.to_string(),
                summary: self.report_summary.unwrap_or_else(|| {
                    self.status
                        .canonical_reason()
                        .unwrap_or("Error")
                        .to_string()
                }),
                details: self.report_details,
            };
            response.extensions_mut().insert(report);
        }

        response
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "unknown_error",
            None,
            ReportPolicy::Report,
        )
        .with_report(format!("{:?}", err), Some(err.to_string()))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(db_err) => db_err.into(),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<RedemptionError> for ApiError {
    fn from(err: RedemptionError) -> Self {
        match err {
            RedemptionError::Rejected { reason, detail } => Self::rejected(reason, detail),
            RedemptionError::Store(store_err) => store_err.into(),
        }
    }
}

impl std::error::Error for ApiError {}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.public_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn envelope(response: Response) -> ErrorEnvelope {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn rejections_use_their_status_and_code() {
        for reason in Rejection::ALL {
            let response = ApiError::rejected(reason, None).into_response();
            assert_eq!(response.status().as_u16(), reason.status_code());
            assert!(response.headers().get("x-error-id").is_none());

            let body = envelope(response).await;
            assert_eq!(body.status, "error");
            assert_eq!(body.error, reason.code());
            assert_eq!(body.id, None);
        }
    }

    #[tokio::test]
    async fn internal_errors_are_reported_without_leaking_the_cause() {
        let response = ApiError::internal("connection reset by peer").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let header_id = response
            .headers()
            .get("x-error-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let report = response.extensions().get::<ErrorReport>().cloned().unwrap();
        assert_eq!(report.summary, "connection reset by peer");

        let body = envelope(response).await;
        assert_eq!(body.error, "unknown_error");
        assert_eq!(body.detail, None);
        assert_eq!(body.id, header_id);
        assert_eq!(body.id.as_deref(), Some(report.id.as_str()));
    }
}
