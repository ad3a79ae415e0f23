pub use super::marker::Entity as Marker;
pub use super::marker_claim::Entity as MarkerClaim;
