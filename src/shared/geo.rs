use std::{cmp, fmt::Display, iter::Sum};

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct Distance(f64);

impl PartialEq for Distance {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl PartialOrd for Distance {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl Distance {
    pub const fn from_meters(distance: f64) -> Self {
        Self(distance)
    }

    pub const fn from_kilometers(distance: f64) -> Self {
        Self(distance * 1000.0)
    }

    pub const fn as_meters(&self) -> f64 {
        self.0
    }

    pub const fn as_kilometers(&self) -> f64 {
        self.0 / 1000.0
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}, {}", self.latitude, self.longitude))
    }
}

/// Averages the coordinates. An empty iterator yields NaN on both axes,
/// use [`calculate_midpoint`] when the input can be empty.
impl Sum for Coordinate {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        let mut count: usize = 0;
        let mut lat: f64 = 0.0;
        let mut lon: f64 = 0.0;
        iter.for_each(|coordinate| {
            count += 1;
            lat += coordinate.latitude;
            lon += coordinate.longitude;
        });
        let count = count as f64;
        Self {
            latitude: lat / count,
            longitude: lon / count,
        }
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<Coordinate> for (f64, f64) {
    fn from(value: Coordinate) -> Self {
        (value.latitude, value.longitude)
    }
}

impl Coordinate {
    pub fn haversine_distance(&self, coord: &Self) -> Distance {
        let dist_lat = f64::to_radians(coord.latitude - self.latitude);
        let dist_lon = f64::to_radians(coord.longitude - self.longitude);
        let a = f64::powi(f64::sin(dist_lat / 2.0), 2)
            + f64::cos(f64::to_radians(self.latitude))
                * f64::cos(f64::to_radians(coord.latitude))
                * f64::sin(dist_lon / 2.0)
                * f64::sin(dist_lon / 2.0);
        let c = 2.0 * f64::atan2(f64::sqrt(a), f64::sqrt(1.0 - a));
        Distance::from_kilometers(EARTH_RADIUS_KM * c)
    }
}

/// Midpoint of a set of stops, used to center a route on the map.
pub fn calculate_midpoint(coordinates: &[Coordinate]) -> Option<Coordinate> {
    if coordinates.is_empty() {
        return None;
    }
    Some(coordinates.iter().copied().sum())
}

/// Converts an OBA orientation (0° east, 90° north, counter-clockwise) into a
/// compass direction (0° north, clockwise).
pub fn to_direction(orientation: f64) -> f64 {
    let mut direction = (-orientation + 90.0) % 360.0;
    if direction < 0.0 {
        direction += 360.0;
    }
    // Collapses -0.0
    if direction == 0.0 { 0.0 } else { direction }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompassOctant {
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
}

impl CompassOctant {
    pub const ALL: [CompassOctant; 8] = [
        CompassOctant::North,
        CompassOctant::Northeast,
        CompassOctant::East,
        CompassOctant::Southeast,
        CompassOctant::South,
        CompassOctant::Southwest,
        CompassOctant::West,
        CompassOctant::Northwest,
    ];

    pub const fn angle(&self) -> f64 {
        match self {
            CompassOctant::North => 0.0,
            CompassOctant::Northeast => 45.0,
            CompassOctant::East => 90.0,
            CompassOctant::Southeast => 135.0,
            CompassOctant::South => 180.0,
            CompassOctant::Southwest => 225.0,
            CompassOctant::West => 270.0,
            CompassOctant::Northwest => 315.0,
        }
    }

    pub const fn icon_name(&self) -> &'static str {
        match self {
            CompassOctant::North => "north",
            CompassOctant::Northeast => "northeast",
            CompassOctant::East => "east",
            CompassOctant::Southeast => "southeast",
            CompassOctant::South => "south",
            CompassOctant::Southwest => "southwest",
            CompassOctant::West => "west",
            CompassOctant::Northwest => "northwest",
        }
    }

    /// Nearest octant by plain angular difference. Ties keep the lower angle
    /// and there is no wrap-around, so 350° resolves to northwest.
    /// A NaN direction never beats the first candidate and lands on north.
    pub fn nearest(direction: f64) -> Self {
        let mut best = CompassOctant::North;
        for candidate in CompassOctant::ALL.into_iter().skip(1) {
            if (candidate.angle() - direction).abs() < (best.angle() - direction).abs() {
                best = candidate;
            }
        }
        best
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub east: f64,
    pub south: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Box of `span` degrees on each axis centered on `center`.
    pub fn around(center: Coordinate, lat_span: f64, lon_span: f64) -> Self {
        Self {
            north: center.latitude + lat_span / 2.0,
            east: center.longitude + lon_span / 2.0,
            south: center.latitude - lat_span / 2.0,
            west: center.longitude - lon_span / 2.0,
        }
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        coordinate.latitude <= self.north
            && coordinate.latitude >= self.south
            && coordinate.longitude <= self.east
            && coordinate.longitude >= self.west
    }
}

#[test]
fn distance_test() {
    let coord_a = Coordinate {
        latitude: 48.85800943005911,
        longitude: 2.3514350059357927,
    };

    let coord_b = Coordinate {
        latitude: 51.5052389927712,
        longitude: -0.12495407345099824,
    };
    let d = coord_a.haversine_distance(&coord_b);
    assert!((d.as_kilometers() - 343.08).abs() < 0.5);
}

#[test]
fn distance_eq_test() {
    let dist_a = Distance::from_meters(1000.0);
    let dist_b = Distance::from_kilometers(1.0);
    assert_eq!(dist_a, dist_b)
}

#[test]
fn distance_cmp_test() {
    let dist_a = Distance::from_meters(1000.0);
    let dist_b = Distance::from_kilometers(0.5);
    assert!(dist_a > dist_b)
}

#[test]
fn nearest_octant_ties_keep_lower_angle() {
    assert_eq!(CompassOctant::nearest(22.5), CompassOctant::North);
    assert_eq!(CompassOctant::nearest(67.5), CompassOctant::Northeast);
    assert_eq!(CompassOctant::nearest(350.0), CompassOctant::Northwest);
    assert_eq!(CompassOctant::nearest(f64::NAN), CompassOctant::North);
}

#[test]
fn bounding_box_contains() {
    let bbox = BoundingBox::around((47.6, -122.3).into(), 0.2, 0.2);
    assert!(bbox.contains(&(47.65, -122.25).into()));
    assert!(!bbox.contains(&(47.8, -122.3).into()));
}

#[test]
fn to_direction_test() {
    assert_eq!(to_direction(0.0), 90.0);
    assert_eq!(to_direction(90.0), 0.0);
    assert_eq!(to_direction(180.0), 270.0);
    assert_eq!(to_direction(270.0), 180.0);
    assert_eq!(to_direction(-90.0), 180.0);
    assert_eq!(to_direction(450.0), 0.0);
    assert!(to_direction(450.0).is_sign_positive());
    for orientation in [-725.0, -45.0, 12.5, 135.0, 359.0, 1000.0] {
        let direction = to_direction(orientation);
        assert!((0.0..360.0).contains(&direction));
        assert!((to_direction(orientation + 360.0) - direction).abs() < 1e-9);
    }
}

#[test]
fn midpoint_test() {
    assert!(calculate_midpoint(&[]).is_none());

    let single = Coordinate {
        latitude: 47.6062,
        longitude: -122.3321,
    };
    let midpoint = calculate_midpoint(&[single]).unwrap();
    assert_eq!(midpoint.latitude, single.latitude);
    assert_eq!(midpoint.longitude, single.longitude);

    let midpoint = calculate_midpoint(&[(0.0, 0.0).into(), (10.0, 20.0).into()]).unwrap();
    assert_eq!(midpoint.latitude, 5.0);
    assert_eq!(midpoint.longitude, 10.0);
}
