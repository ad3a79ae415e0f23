use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{Coordinates, Value};

/// Reward granted when a marker is claimed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Reward {
    /// Reward kind, e.g. `m1u`, `clue`, `badge`
    pub kind: String,
    /// M1U credited to the user
    #[serde(default)]
    pub amount: i64,
    /// Opaque payload copied into the claim
    #[serde(default)]
    pub data: Value,
}

/// A geo-located, time-bounded reward point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Marker {
    pub id: String,
    pub title: String,
    pub position: Coordinates,
    pub active: bool,
    /// Start of the visibility window, unbounded when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_from: Option<DateTime<Utc>>,
    /// End of the visibility window, unbounded when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_to: Option<DateTime<Utc>>,
    /// Overrides the configured redemption radius
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_m: Option<f64>,
    pub reward: Reward,
    /// Client route to open after a successful claim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_route: Option<String>,
}

/// Where `now` falls relative to a marker's visibility window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    NotYetVisible,
    Visible,
    Lapsed,
}

impl Marker {
    pub fn visibility_at(&self, now: DateTime<Utc>) -> Visibility {
        if self.visible_to.is_some_and(|to| now > to) {
            return Visibility::Lapsed;
        }
        if self.visible_from.is_some_and(|from| now < from) {
            return Visibility::NotYetVisible;
        }
        Visibility::Visible
    }

    /// Own radius when it is a usable distance, otherwise the default.
    pub fn radius_or(&self, default_radius_m: f64) -> f64 {
        self.radius_m
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(default_radius_m)
    }
}

/// Record of a user redeeming a marker. Unique per `(marker_id, user_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Claim {
    pub marker_id: String,
    pub user_id: String,
    pub receipt_id: String,
    pub reward_type: String,
    pub reward_data: Value,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn marker(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Marker {
        Marker {
            id: "m".into(),
            title: "Colosseo".into(),
            position: Coordinates::new(41.8902, 12.4922),
            active: true,
            visible_from: from,
            visible_to: to,
            radius_m: None,
            reward: Reward {
                kind: "m1u".into(),
                amount: 10,
                data: Value::Null,
            },
            next_route: None,
        }
    }

    #[test]
    fn unbounded_window_is_visible() {
        assert_eq!(marker(None, None).visibility_at(Utc::now()), Visibility::Visible);
    }

    #[test]
    fn window_bounds() {
        let now = Utc::now();
        let hour = Duration::hours(1);

        assert_eq!(
            marker(Some(now - hour), Some(now + hour)).visibility_at(now),
            Visibility::Visible
        );
        assert_eq!(
            marker(Some(now + hour), None).visibility_at(now),
            Visibility::NotYetVisible
        );
        assert_eq!(
            marker(None, Some(now - hour)).visibility_at(now),
            Visibility::Lapsed
        );
        // bounds are inclusive
        assert_eq!(marker(Some(now), Some(now)).visibility_at(now), Visibility::Visible);
    }

    #[test]
    fn unusable_radius_uses_the_default() {
        let mut m = marker(None, None);
        assert_eq!(m.radius_or(100.0), 100.0);

        m.radius_m = Some(35.0);
        assert_eq!(m.radius_or(100.0), 35.0);

        for radius in [f64::NAN, f64::INFINITY, -1.0, 0.0] {
            m.radius_m = Some(radius);
            assert_eq!(m.radius_or(100.0), 100.0, "radius {radius}");
        }
    }
}
