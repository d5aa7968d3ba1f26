//! The 5250 data-stream parser and client input encoder: the two
//! directions of wire traffic a TN5250 session exchanges once telnet
//! option negotiation has settled.
//!
//! [`parser::parse_record`] applies a host-to-client record's orders to
//! a [`gst_screen::ScreenBuffer`] in place. [`encoder::encode`] builds
//! the client-to-host record carrying an AID key and the fields the
//! user modified. Both share the GDS header/`IAC EOR` framing in
//! [`framing`].

#![deny(unsafe_code)]

pub mod encoder;
pub mod framing;
pub mod parser;

pub use encoder::{encode, ModifiedField};
pub use framing::GdsHeader;
pub use parser::{parse_record, ParsedRecord};
