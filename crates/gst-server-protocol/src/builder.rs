//! Fluent builder for host-to-client 5250 records.
//!
//! Mirrors the order in which a real controller would emit a write-to-
//! display frame: clear, announce the write, then place orders and text
//! one call at a time.

use gst_protocol::framing;
use gst_wire::{
    ESC, FFW_BYPASS, FFW_SHIFT_NONDISPLAY, CMD_CLEAR_UNIT, CMD_WRITE_TO_DISPLAY, ORDER_IC,
    ORDER_RA, ORDER_SBA, ORDER_SF,
};

/// Accumulates 5250 orders into a record body, then frames it as a
/// complete wire record.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    body: Vec<u8>,
}

impl RecordBuilder {
    /// Start a fresh, empty record.
    #[must_use]
    pub fn new() -> Self {
        Self { body: Vec::new() }
    }

    /// Emit `ESC CLEAR_UNIT`.
    #[must_use]
    pub fn clear_unit(mut self) -> Self {
        self.body.extend([ESC, CMD_CLEAR_UNIT]);
        self
    }

    /// Emit `ESC WRITE_TO_DISPLAY cc1 cc2`.
    #[must_use]
    pub fn write_to_display(mut self, cc1: u8, cc2: u8) -> Self {
        self.body.extend([ESC, CMD_WRITE_TO_DISPLAY, cc1, cc2]);
        self
    }

    /// Emit `SBA row col`.
    #[must_use]
    pub fn set_buffer_address(mut self, row: u16, col: u16) -> Self {
        self.body.extend([ORDER_SBA, row as u8, col as u8]);
        self
    }

    /// Emit `SF ffw0 ffw1` with the given raw field format word bytes.
    #[must_use]
    pub fn start_field(mut self, ffw0: u8, ffw1: u8) -> Self {
        self.body.extend([ORDER_SF, ffw0, ffw1]);
        self
    }

    /// Start an enterable, plain-display input field (no protect bit, no
    /// nondisplay shift class).
    #[must_use]
    pub fn start_input_field(self) -> Self {
        self.start_field(0x00, 0x00)
    }

    /// Start an enterable field whose typed data is not echoed to the
    /// screen (a password-style field).
    #[must_use]
    pub fn start_hidden_field(self) -> Self {
        self.start_field(FFW_SHIFT_NONDISPLAY, 0x00)
    }

    /// Start a non-enterable (read-only) field, used both for display
    /// labels and as a field terminator.
    #[must_use]
    pub fn start_protected_field(self) -> Self {
        self.start_field(FFW_BYPASS, 0x00)
    }

    /// Emit `IC` at the current write position.
    #[must_use]
    pub fn insert_cursor(mut self) -> Self {
        self.body.push(ORDER_IC);
        self
    }

    /// Emit `RA row col char`, repeating `char` from the current write
    /// position up to (but not including) `(row, col)`.
    #[must_use]
    pub fn repeat_to_address(mut self, row: u16, col: u16, ch: char) -> Self {
        let ebcdic = gst_codec::from_ascii(ch as u8);
        self.body.extend([ORDER_RA, row as u8, col as u8, ebcdic]);
        self
    }

    /// Append raw text, EBCDIC-translated, at the current write
    /// position.
    #[must_use]
    pub fn write_text(mut self, text: &str) -> Self {
        self.body.extend(gst_codec::encode_str(text));
        self
    }

    /// Append `value`, left-aligned and space-padded (or truncated) to
    /// `length` columns, EBCDIC-translated.
    #[must_use]
    pub fn write_field_value(mut self, value: &str, length: u16) -> Self {
        let mut padded = value.to_string();
        if padded.chars().count() > length as usize {
            padded = padded.chars().take(length as usize).collect();
        }
        while (padded.chars().count() as u16) < length {
            padded.push(' ');
        }
        self.body.extend(gst_codec::encode_str(&padded));
        self
    }

    /// Frame the accumulated body into a complete, `IAC`-doubled,
    /// `IAC EOR`-terminated wire record with the given GDS opcode.
    #[must_use]
    pub fn build(self, opcode: u8) -> Vec<u8> {
        let header = framing::build_header(self.body.len(), opcode);
        let mut record = header.to_vec();
        record.extend(self.body);
        let mut framed = framing::escape(&record);
        framed.push(gst_wire::IAC);
        framed.push(gst_wire::EOR);
        framed
    }
}
