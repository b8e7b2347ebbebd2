//! Travel time between staff home locations and job sites.

use crate::domain::Location;

/// Maps a pair of locations to a travel cost in hours.
///
/// Implementations must be pure, symmetric and total over every location.
pub trait TravelTimeOracle {
    fn travel_time(&self, from: &Location, to: &Location) -> f64;
}

/// Fixed compass-zone policy table.
///
/// | pair             | hours |
/// |------------------|-------|
/// | same location    | 0     |
/// | East / West      | 2     |
/// | North / South    | 1     |
/// | any other pair   | 0.5   |
#[derive(Debug, Clone, Copy, Default)]
pub struct CompassTravelTimes;

const OPPOSITE_EAST_WEST_HOURS: f64 = 2.0;
const OPPOSITE_NORTH_SOUTH_HOURS: f64 = 1.0;
const DEFAULT_HOURS: f64 = 0.5;

impl TravelTimeOracle for CompassTravelTimes {
    fn travel_time(&self, from: &Location, to: &Location) -> f64 {
        travel_time(from, to)
    }
}

/// Travel hours between two locations under the compass-zone table.
///
/// # Examples
///
/// ```
/// use staff_rostering::domain::Location;
/// use staff_rostering::travel::travel_time;
///
/// assert_eq!(travel_time(&Location::East, &Location::West), 2.0);
/// assert_eq!(travel_time(&Location::South, &Location::North), 1.0);
/// assert_eq!(travel_time(&Location::North, &Location::East), 0.5);
/// assert_eq!(travel_time(&Location::West, &Location::West), 0.0);
/// ```
pub fn travel_time(from: &Location, to: &Location) -> f64 {
    use Location::*;

    if from == to {
        return 0.0;
    }
    match (from, to) {
        (East, West) | (West, East) => OPPOSITE_EAST_WEST_HOURS,
        (North, South) | (South, North) => OPPOSITE_NORTH_SOUTH_HOURS,
        _ => DEFAULT_HOURS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_locations() -> Vec<Location> {
        vec![
            Location::North,
            Location::South,
            Location::East,
            Location::West,
            Location::Other("Harbour".to_string()),
            Location::Other("Airport".to_string()),
        ]
    }

    #[test]
    fn test_symmetric_and_zero_on_diagonal() {
        let locations = all_locations();
        for a in &locations {
            assert_eq!(travel_time(a, a), 0.0, "{a} to itself");
            for b in &locations {
                assert_eq!(travel_time(a, b), travel_time(b, a), "{a} <-> {b}");
            }
        }
    }

    #[test]
    fn test_unknown_locations_use_default() {
        let harbour = Location::Other("Harbour".to_string());
        let airport = Location::Other("Airport".to_string());

        assert_eq!(travel_time(&harbour, &airport), 0.5);
        assert_eq!(travel_time(&harbour, &Location::East), 0.5);
        assert_eq!(travel_time(&harbour, &harbour.clone()), 0.0);
    }

    #[test]
    fn test_oracle_matches_table() {
        let oracle = CompassTravelTimes;
        assert_eq!(oracle.travel_time(&Location::West, &Location::East), 2.0);
        assert_eq!(oracle.travel_time(&Location::North, &Location::South), 1.0);
        assert_eq!(oracle.travel_time(&Location::North, &Location::West), 0.5);
    }
}
