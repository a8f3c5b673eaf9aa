//! HTTP transport for the station API.
//!
//! Turns a URL plus query parameters into a [`Deferred`](crate::deferred::Deferred)
//! document. The request's completion is forwarded into the deferred value's
//! resolver as a single `fulfill` or `reject` call.

mod client;
mod error;
mod query;

pub use client::Transport;
pub use error::TransportError;
pub use query::{format_params, with_params};
