//! Test utilities for the quilt crates.
//!
//! - [`layout`]: random chunk layouts over a known sequence of values, with the
//!   chunks supplied in every accepted input representation;
//! - [`model`]: a flat, fully materialized model of the same sequence that
//!   selections and assignments can be checked against.

pub mod layout;
pub mod model;
