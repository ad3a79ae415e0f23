//! Typed caller of the redemption endpoint.

mod client;
mod gate;

pub use client::{ClientError, RedemptionClient};
pub use gate::{InFlight, RedemptionGate};
