//! Client code for outpost.
//!
//! This crate provides the HTTP fetch pipeline shared by the proxy's
//! request routing and its provisioning lifecycle.

pub mod fetch;

pub use fetch::{Fetch, FetchClient, FetchConfig, FetchedResponse, ResponseKind, canonicalize};
