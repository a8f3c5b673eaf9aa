//! Client library for the V'Lille bike-sharing station API.
//!
//! Lists stations, fetches live details of one station, and finds the
//! stations nearest to a point. Every query returns a [`Deferred`]: a
//! single-resolution asynchronous value that can be chained with
//! [`Deferred::then`] or simply awaited.
//!
//! ```no_run
//! use vlille::{Coordinates, Scheduler, Vlille, VlilleConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let scheduler = Scheduler::spawn_on(&tokio::runtime::Handle::current());
//! let client = Vlille::new(VlilleConfig::new("http://localhost:8080/proxy"), &scheduler)?;
//!
//! let nearest = client
//!     .closest_stations(Coordinates::new(50.6292, 3.0573), None)
//!     .await?;
//! for ranked in nearest {
//!     println!("{:?} at {:.0} m", ranked.station.name(), ranked.distance);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod deferred;
pub mod domain;
pub mod error;
pub mod geo;
pub mod projection;
pub mod scheduler;
pub mod transport;
pub mod xml;

pub use client::{Vlille, VlilleConfig};
pub use deferred::{Deferred, DeferredError, DeferredState, Rejection, Resolution, Resolver, Thenable};
pub use domain::{Coordinates, RankedStation, StationDetails, StationId, StationMarker};
pub use error::VlilleError;
pub use scheduler::{JobQueue, Scheduler};
pub use transport::{Transport, TransportError};
