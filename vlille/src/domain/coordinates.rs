//! Geographic coordinates.

use std::fmt;

use serde::Serialize;

/// A point on the Earth's surface, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    /// Latitude, positive north
    pub lat: f64,
    /// Longitude, positive east
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Parse a latitude/longitude pair of decimal strings.
    ///
    /// Returns `None` if either part is not a finite number.
    pub fn parse(lat: &str, lon: &str) -> Option<Self> {
        let lat: f64 = lat.trim().parse().ok()?;
        let lon: f64 = lon.trim().parse().ok()?;

        (lat.is_finite() && lon.is_finite()).then_some(Self { lat, lon })
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_decimal_strings() {
        assert_eq!(
            Coordinates::parse("50.6419", " 3.07599"),
            Some(Coordinates::new(50.6419, 3.07599))
        );
        assert_eq!(
            Coordinates::parse("-1", "0"),
            Some(Coordinates::new(-1.0, 0.0))
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(Coordinates::parse("", "3.0"), None);
        assert_eq!(Coordinates::parse("50.6", "east"), None);
        assert_eq!(Coordinates::parse("NaN", "3.0"), None);
        assert_eq!(Coordinates::parse("50.6", "inf"), None);
    }

    #[test]
    fn display() {
        assert_eq!(Coordinates::new(50.5, 3.25).to_string(), "(50.5, 3.25)");
    }
}
