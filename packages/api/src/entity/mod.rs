pub mod prelude;

pub mod marker;
pub mod marker_claim;
