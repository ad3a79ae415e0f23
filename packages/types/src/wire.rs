//! JSON shapes of the redemption endpoint.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{Coordinates, Rejection, RedemptionResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RedeemRequest {
    #[serde(rename = "markerId")]
    pub marker_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    /// Reported GPS accuracy in meters, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

impl RedeemRequest {
    pub fn new(marker_id: impl Into<String>, position: Option<Coordinates>) -> Self {
        Self {
            marker_id: marker_id.into(),
            lat: position.map(|p| p.lat),
            lng: position.map(|p| p.lng),
            accuracy: None,
        }
    }

    pub fn position(&self) -> Option<Coordinates> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RedeemSuccess {
    pub ok: bool,
    pub receipt_id: String,
    pub rewards: i64,
    #[serde(rename = "nextRoute", default, skip_serializing_if = "Option::is_none")]
    pub next_route: Option<String>,
}

/// Body of every non-2xx response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorEnvelope {
    pub status: String,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Reportable error id, only set for infrastructure failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            status: "error".to_string(),
            error: error.into(),
            detail,
            id: None,
        }
    }
}

impl RedemptionResult {
    /// Interprets a raw endpoint response. Anything that does not match a known
    /// success or rejection shape becomes `UnknownError`.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        if (200..300).contains(&status) {
            return match serde_json::from_slice::<RedeemSuccess>(body) {
                Ok(success) if success.ok => RedemptionResult::Success {
                    receipt_id: success.receipt_id,
                    rewards: success.rewards,
                    next_route: success.next_route,
                },
                _ => RedemptionResult::UnknownError,
            };
        }

        match serde_json::from_slice::<ErrorEnvelope>(body) {
            Ok(envelope) if envelope.status == "error" => Rejection::from_code(&envelope.error)
                .map(RedemptionResult::from)
                .unwrap_or(RedemptionResult::UnknownError),
            _ => RedemptionResult::UnknownError,
        }
    }
}
