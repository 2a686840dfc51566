//! Simulated vessel moving through a fixed list of ports

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        GeoPoint { lat, lng }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub location: GeoPoint,
    pub amount_usd: f64,
    pub city: String,
}

impl Waypoint {
    pub fn new(lat: f64, lng: f64, amount_usd: f64, city: &str) -> Self {
        Waypoint {
            location: GeoPoint::new(lat, lng),
            amount_usd,
            city: city.to_string(),
        }
    }
}

/// Where the route begins and ends; neither counts as a stop.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteEnds {
    pub origin: (GeoPoint, String),
    pub destination: (GeoPoint, String),
}

pub fn default_route() -> (RouteEnds, Vec<Waypoint>) {
    let ends = RouteEnds {
        origin: (GeoPoint::new(22.3193, 114.1694), "Hong Kong Port".to_string()),
        destination: (GeoPoint::new(28.6139, 77.2090), "New Delhi (Inland)".to_string()),
    };
    let stops = vec![
        Waypoint::new(3.0431, 101.3847, 5000.0, "Port Klang, Malaysia"),
        Waypoint::new(6.9271, 79.8612, 10000.0, "Colombo, Sri Lanka"),
        Waypoint::new(18.9686, 72.8322, 15000.0, "Mumbai Port, India"),
        Waypoint::new(13.0827, 80.2707, 20000.0, "Chennai Port, India"),
    ];
    (ends, stops)
}

#[derive(Debug, Clone)]
pub struct ShipmentTracker {
    ends: RouteEnds,
    waypoints: Vec<Waypoint>,
    current_index: usize,
    current_position: GeoPoint,
    progress_percent: f64,
    selected: Option<usize>,
}

impl Default for ShipmentTracker {
    fn default() -> Self {
        let (ends, stops) = default_route();
        Self::new(ends, stops)
    }
}

impl ShipmentTracker {
    pub fn new(ends: RouteEnds, waypoints: Vec<Waypoint>) -> Self {
        let current_position = ends.origin.0;
        ShipmentTracker {
            ends,
            waypoints,
            current_index: 0,
            current_position,
            progress_percent: 0.0,
            selected: None,
        }
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn ends(&self) -> &RouteEnds {
        &self.ends
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_position(&self) -> GeoPoint {
        self.current_position
    }

    pub fn progress_percent(&self) -> f64 {
        self.progress_percent
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.waypoints.len()
    }

    /// Moves the ship to the next stop. Returns `false` once every stop has
    /// been reached; the state is frozen from then on.
    pub fn advance(&mut self) -> bool {
        let Some(next) = self.waypoints.get(self.current_index) else {
            return false;
        };
        self.current_position = next.location;
        self.progress_percent = 100.0 * (self.current_index + 1) as f64 / self.waypoints.len() as f64;
        self.current_index += 1;
        debug!(
            city = %next.city,
            progress = self.progress_percent,
            "Ship advanced"
        );
        true
    }

    /// Marker click. Any stop can be inspected, reached or not.
    pub fn select_stop(&mut self, index: usize) -> Option<&Waypoint> {
        let stop = self.waypoints.get(index)?;
        self.selected = Some(index);
        Some(stop)
    }

    pub fn selected_stop(&self) -> Option<&Waypoint> {
        self.selected.and_then(|i| self.waypoints.get(i))
    }

    pub fn total_amount(&self) -> f64 {
        self.waypoints.iter().map(|w| w.amount_usd).sum()
    }

    /// Polyline through the origin and every stop.
    pub fn route(&self) -> Vec<GeoPoint> {
        std::iter::once(self.ends.origin.0)
            .chain(self.waypoints.iter().map(|w| w.location))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let tracker = ShipmentTracker::default();
        assert_eq!(tracker.current_index(), 0);
        assert_eq!(tracker.progress_percent(), 0.0);
        assert_eq!(tracker.current_position(), GeoPoint::new(22.3193, 114.1694));
        assert_eq!(tracker.total_amount(), 50000.0);
        assert_eq!(tracker.route().len(), 5);
        assert!(tracker.selected_stop().is_none());
    }

    #[test]
    fn test_advances_to_terminal_state() {
        let mut tracker = ShipmentTracker::default();
        let expected = [25.0, 50.0, 75.0, 100.0];

        for (i, pct) in expected.iter().enumerate() {
            assert!(tracker.advance());
            assert_eq!(tracker.progress_percent(), *pct);
            assert_eq!(tracker.current_index(), i + 1);
            assert_eq!(tracker.current_position(), tracker.waypoints()[i].location);
        }
        assert!(tracker.is_complete());

        let position = tracker.current_position();
        for _ in 0..3 {
            assert!(!tracker.advance());
        }
        assert_eq!(tracker.current_index(), 4);
        assert_eq!(tracker.progress_percent(), 100.0);
        assert_eq!(tracker.current_position(), position);
    }

    #[test]
    fn test_select_any_stop() {
        let mut tracker = ShipmentTracker::default();
        let stop = tracker.select_stop(3).unwrap();
        assert_eq!(stop.city, "Chennai Port, India");
        assert_eq!(tracker.selected_stop().unwrap().amount_usd, 20000.0);
        // Selection does not move the ship
        assert_eq!(tracker.current_index(), 0);

        assert!(tracker.select_stop(9).is_none());
        assert_eq!(tracker.selected_stop().unwrap().city, "Chennai Port, India");
    }

    #[test]
    fn test_empty_route_is_already_complete() {
        let (ends, _) = default_route();
        let mut tracker = ShipmentTracker::new(ends, vec![]);
        assert!(tracker.is_complete());
        assert!(!tracker.advance());
        assert_eq!(tracker.progress_percent(), 0.0);
    }
}
