//! Station records projected from API documents.

use serde::{Serialize, Serializer};

use super::{Coordinates, StationId};

/// A station as listed by the stations feed.
///
/// Holds the raw attributes of one `<marker>` element in document order
/// (typically `id`, `lat`, `lng` and `name`), with typed accessors for the
/// ones the library relies on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationMarker {
    attributes: Vec<(String, String)>,
}

impl StationMarker {
    pub fn new(attributes: Vec<(String, String)>) -> Self {
        Self { attributes }
    }

    /// Raw attribute lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        lookup(&self.attributes, name)
    }

    /// All attributes in document order.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// The station number, if present and valid.
    pub fn id(&self) -> Option<StationId> {
        self.get("id").and_then(|id| StationId::parse(id).ok())
    }

    pub fn name(&self) -> Option<&str> {
        self.get("name")
    }

    /// Position from the `lat`/`lng` attributes.
    ///
    /// Returns `None` if either is missing or not a number.
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::parse(self.get("lat")?, self.get("lng")?)
    }
}

impl Serialize for StationMarker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.attributes.iter().map(|(k, v)| (k, v)))
    }
}

/// Live details of a single station.
///
/// Maps each child element of the details document to its text, e.g.
/// `bikes` → `"11"`. Field names are the API's own (`adress`, `attachs`,
/// `paiement`, `lastupd`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationDetails {
    fields: Vec<(String, String)>,
}

impl StationDetails {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// Raw field lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        lookup(&self.fields, name)
    }

    /// All fields in document order.
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn address(&self) -> Option<&str> {
        self.get("adress")
    }

    pub fn status(&self) -> Option<&str> {
        self.get("status")
    }

    /// Number of bikes available.
    pub fn bikes(&self) -> Option<u32> {
        self.get("bikes").and_then(|n| n.trim().parse().ok())
    }

    /// Number of free docking points.
    pub fn attachs(&self) -> Option<u32> {
        self.get("attachs").and_then(|n| n.trim().parse().ok())
    }

    /// Payment terminal availability.
    pub fn payment(&self) -> Option<&str> {
        self.get("paiement")
    }

    /// Free-form age of the data, as reported by the API.
    pub fn last_update(&self) -> Option<&str> {
        self.get("lastupd")
    }
}

impl Serialize for StationDetails {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.fields.iter().map(|(k, v)| (k, v)))
    }
}

/// A station together with its distance from a reference point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedStation {
    #[serde(flatten)]
    pub station: StationMarker,
    /// Great-circle distance in meters
    pub distance: f64,
}

fn lookup<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}
