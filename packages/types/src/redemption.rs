use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reason a redemption was refused. These are routine outcomes, not faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    #[error("no valid session")]
    Unauthorized,
    #[error("marker is not active")]
    Inactive,
    #[error("marker is outside its visibility window")]
    Expired,
    #[error("user is outside the redemption radius")]
    OutOfRange,
    #[error("marker already claimed by this user")]
    AlreadyClaimed,
    #[error("too many redemption attempts")]
    RateLimited,
}

impl Rejection {
    pub const ALL: [Rejection; 6] = [
        Rejection::Unauthorized,
        Rejection::Inactive,
        Rejection::Expired,
        Rejection::OutOfRange,
        Rejection::AlreadyClaimed,
        Rejection::RateLimited,
    ];

    /// Wire code used in the `error` field of rejection envelopes.
    pub const fn code(self) -> &'static str {
        match self {
            Rejection::Unauthorized => "unauthorized",
            Rejection::Inactive => "inactive",
            Rejection::Expired => "expired",
            Rejection::OutOfRange => "out_of_range",
            Rejection::AlreadyClaimed => "already_claimed",
            Rejection::RateLimited => "rate_limited",
        }
    }

    pub const fn status_code(self) -> u16 {
        match self {
            Rejection::Unauthorized => 401,
            Rejection::OutOfRange => 403,
            Rejection::AlreadyClaimed => 409,
            Rejection::Expired => 410,
            Rejection::Inactive => 423,
            Rejection::RateLimited => 429,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Error,
}

/// Outcome of a redemption as seen by the caller. Closed set; branch exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedemptionResult {
    Success {
        receipt_id: String,
        rewards: i64,
        next_route: Option<String>,
    },
    AlreadyClaimed,
    OutOfRange,
    Expired,
    Inactive,
    RateLimited,
    Unauthorized,
    UnknownError,
}

impl RedemptionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, RedemptionResult::Success { .. })
    }

    /// `AlreadyClaimed` is informational; everything else that is not a success is an error.
    pub fn severity(&self) -> Severity {
        match self {
            RedemptionResult::Success { .. } => Severity::Success,
            RedemptionResult::AlreadyClaimed => Severity::Info,
            RedemptionResult::OutOfRange
            | RedemptionResult::Expired
            | RedemptionResult::Inactive
            | RedemptionResult::RateLimited
            | RedemptionResult::Unauthorized
            | RedemptionResult::UnknownError => Severity::Error,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RedemptionResult::Success { .. } => "Reward claimed!",
            RedemptionResult::AlreadyClaimed => "You have already claimed this reward.",
            RedemptionResult::OutOfRange => "Get closer to the marker to claim it.",
            RedemptionResult::Expired => "This marker is no longer available.",
            RedemptionResult::Inactive => "This marker is not active.",
            RedemptionResult::RateLimited => "Too many attempts. Wait a moment and try again.",
            RedemptionResult::Unauthorized => "Your session has expired. Sign in again.",
            RedemptionResult::UnknownError => "Something went wrong. Try again.",
        }
    }
}

impl From<Rejection> for RedemptionResult {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Unauthorized => RedemptionResult::Unauthorized,
            Rejection::Inactive => RedemptionResult::Inactive,
            Rejection::Expired => RedemptionResult::Expired,
            Rejection::OutOfRange => RedemptionResult::OutOfRange,
            Rejection::AlreadyClaimed => RedemptionResult::AlreadyClaimed,
            Rejection::RateLimited => RedemptionResult::RateLimited,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn codes_and_statuses_are_distinct() {
        let codes: HashSet<_> = Rejection::ALL.iter().map(|r| r.code()).collect();
        let statuses: HashSet<_> = Rejection::ALL.iter().map(|r| r.status_code()).collect();
        assert_eq!(codes.len(), Rejection::ALL.len());
        assert_eq!(statuses.len(), Rejection::ALL.len());
    }

    #[test]
    fn from_code_inverts_code() {
        for rejection in Rejection::ALL {
            assert_eq!(Rejection::from_code(rejection.code()), Some(rejection));
        }
        assert_eq!(Rejection::from_code("teapot"), None);
    }

    #[test]
    fn already_claimed_is_informational() {
        assert_eq!(RedemptionResult::AlreadyClaimed.severity(), Severity::Info);
        assert_eq!(RedemptionResult::OutOfRange.severity(), Severity::Error);
        assert_eq!(RedemptionResult::UnknownError.severity(), Severity::Error);
    }

    #[test]
    fn messages_are_distinct() {
        let all = [
            RedemptionResult::Success {
                receipt_id: "r".into(),
                rewards: 0,
                next_route: None,
            },
            RedemptionResult::AlreadyClaimed,
            RedemptionResult::OutOfRange,
            RedemptionResult::Expired,
            RedemptionResult::Inactive,
            RedemptionResult::RateLimited,
            RedemptionResult::Unauthorized,
            RedemptionResult::UnknownError,
        ];
        let messages: HashSet<_> = all.iter().map(|r| r.message()).collect();
        assert_eq!(messages.len(), all.len());
    }
}
