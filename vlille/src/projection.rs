//! Projection of API documents to station records.
//!
//! Both projections are total: elements the API did not send simply do not
//! appear in the output.

use crate::domain::{StationDetails, StationMarker};
use crate::xml::Document;

/// Project the stations feed: one marker per child element of the root,
/// carrying that element's attributes.
pub fn stations_from_document(document: &Document) -> Vec<StationMarker> {
    document
        .root()
        .children
        .iter()
        .map(|marker| StationMarker::new(marker.attributes.clone()))
        .collect()
}

/// Project a station details document: each child element of the root
/// becomes a field named after the element, valued with its text exactly
/// as sent, surrounding spaces included.
pub fn station_from_document(document: &Document) -> StationDetails {
    StationDetails::new(
        document
            .root()
            .children
            .iter()
            .map(|field| (field.name.clone(), field.text.clone()))
            .collect(),
    )
}
