//! Coarse distance buckets attached to analytics events.

use crate::shared::geo::{Coordinate, Distance};

const BUCKETS: [(f64, &str); 7] = [
    (50.0, "User Distance: 00000-00050m"),
    (100.0, "User Distance: 00050-00100m"),
    (200.0, "User Distance: 00100-00200m"),
    (400.0, "User Distance: 00200-00400m"),
    (800.0, "User Distance: 00400-00800m"),
    (1600.0, "User Distance: 00800-01600m"),
    (3200.0, "User Distance: 01600-03200m"),
];

pub fn distance_category(distance: Distance) -> &'static str {
    let meters = distance.as_meters();
    BUCKETS
        .iter()
        .find(|(limit, _)| meters < *limit)
        .map(|(_, label)| *label)
        .unwrap_or("User Distance: 03200-INFINITY")
}

pub fn distance_to_stop_category(user: &Coordinate, stop: &Coordinate) -> &'static str {
    distance_category(user.haversine_distance(stop))
}
