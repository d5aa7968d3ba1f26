//! Server-side half of the 5250 protocol: a fluent record builder, a
//! catalog-driven screen renderer, and an input field extractor.
//!
//! Together these let [`gst_daemon`](../gst_daemon/index.html) paint a
//! catalog screen and turn a client's reply back into named field
//! values, without either side hand-assembling orders.

#![deny(unsafe_code)]

pub mod builder;
pub mod extractor;
pub mod renderer;

pub use builder::RecordBuilder;
pub use extractor::extract;
pub use renderer::render;
