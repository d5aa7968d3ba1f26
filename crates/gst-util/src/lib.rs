//! Shared, dependency-light utilities used across the workspace:
//! `{{key}}` placeholder substitution and currency-aware decimal parsing.
//!
//! Kept free of the data dictionary / component types so that both
//! `gst-dict` and `gst-engine` can depend on it without a cycle.

#![deny(unsafe_code)]

mod numeric;
mod placeholder;

pub use numeric::{parse_decimal, round_banker};
pub use placeholder::{referenced_keys, substitute};
