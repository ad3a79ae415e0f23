pub mod coordinates;
pub mod marker;
pub mod redemption;
pub mod sequence;
pub mod wire;

pub use coordinates::Coordinates;
pub use marker::{Claim, Marker, Reward, Visibility};
pub use redemption::{Rejection, RedemptionResult, Severity};
pub use serde_json::Value;

/// Opaque identifier used for receipts and reportable error ids.
pub fn create_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
