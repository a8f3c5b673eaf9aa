//! Domain types for the station API.
//!
//! Records are kept close to what the API sends: projections never fail,
//! and typed accessors return `None` where a field is missing or malformed.
//! Identifiers enforce their invariants at construction time.

mod coordinates;
mod station;
mod station_id;

pub use coordinates::Coordinates;
pub use station::{RankedStation, StationDetails, StationMarker};
pub use station_id::{InvalidStationId, StationId};
